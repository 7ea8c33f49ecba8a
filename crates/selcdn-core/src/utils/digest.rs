use md5::{Digest, Md5};

/// Lowercase hex MD5 of the content, the form the storage API uses for ETags.
pub fn content_md5(content: &[u8]) -> String {
    format!("{:x}", Md5::digest(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_md5_hello() {
        assert_eq!(content_md5(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_content_md5_empty() {
        assert_eq!(content_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }
}
