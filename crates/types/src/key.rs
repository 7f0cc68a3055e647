/// Join two user-supplied strings into one map key. `/` separates the two
/// parts; a literal `/` or `\` inside either part is backslash-escaped first,
/// so distinct pairs never produce the same key.
pub(crate) fn composite_key(left: &str, right: &str) -> String {
    fn escape(part: &str) -> String {
        part.replace('\\', "\\\\").replace('/', "\\/")
    }
    format!("{}/{}", escape(left), escape(right))
}
