use md5::{Digest, Md5};

/// Content address of a byte buffer: lowercase hex MD5.
///
/// Used over the resized original, so byte-identical derivatives share one
/// storage key.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
