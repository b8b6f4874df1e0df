use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::{Error, Result};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

/// Reader/writer wrapper hashing every byte that passes through it
#[derive(Debug)]
pub struct Checksum<T> {
    inner: T,
    digest: Sha1,
}

impl<T> Checksum<T> {
    pub fn new(inner: T) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Checksum<T> {
    pub fn read(&mut self, size: usize) -> Result<Bytes> {
        let mut buffer = vec![0; size];
        self.inner
            .read_exact(&mut buffer)
            .map_err(|_| Error::IndexCorrupt("unexpected end-of-file while reading index".into()))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    /// Compare the trailing checksum with the digest of everything read so far
    pub fn verify(&mut self) -> Result<()> {
        let mut expected = [0u8; CHECKSUM_SIZE];
        self.inner
            .read_exact(&mut expected)
            .map_err(|_| Error::IndexCorrupt("index is missing its checksum".into()))?;

        if expected != self.digest.clone().finalize().as_slice() {
            return Err(Error::IndexCorrupt(
                "checksum does not match value stored on disk".into(),
            ));
        }

        let mut trailing = [0u8; 1];
        if self.inner.read(&mut trailing)? != 0 {
            return Err(Error::IndexCorrupt("unexpected data after checksum".into()));
        }

        Ok(())
    }
}

impl<T: Write> Checksum<T> {
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub fn write_checksum(&mut self) -> Result<()> {
        let checksum = self.digest.clone().finalize();
        self.inner.write_all(checksum.as_slice())?;
        Ok(())
    }
}
