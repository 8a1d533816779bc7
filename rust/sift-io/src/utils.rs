/// Builds the `UnexpectedEof` error reported when a cursor runs past the end of `name`.
pub fn eof_error(name: &str, pos: u64, len: u64) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("read past EOF: {name} (pos {pos}, length {len})"),
    )
}
