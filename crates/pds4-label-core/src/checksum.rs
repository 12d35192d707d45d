use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};

const BLOCK_SIZE: usize = 64 * 1024;

/// Lowercase hex MD5 of a file, read block by block.
pub fn md5_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    md5_reader(&mut file)
}

pub fn md5_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
