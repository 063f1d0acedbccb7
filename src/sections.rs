//! Splitting rule files into blank-line-delimited blocks.

/// One rule block as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    /// Block text with `//` comments removed, one `\n` after every line.
    pub text: String,
    /// Block text exactly as written, without the final newline.
    pub raw_text: String,
    /// 1-based line number of the first line of the block.
    pub start_line: usize,
}

/// Split `lines` into blocks separated by one or more blank lines.
///
/// Blocks that are empty once comments are removed are dropped.
pub fn split_sections<I, S>(lines: I) -> Vec<RawSection>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sections = Vec::new();
    let mut open: Option<RawSection> = None;

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            close(&mut open, &mut sections);
            continue;
        }
        let block = open.get_or_insert_with(|| RawSection {
            text: String::new(),
            raw_text: String::new(),
            start_line: index + 1,
        });
        block.raw_text.push_str(line);
        block.raw_text.push('\n');
        block.text.push_str(strip_comment(line));
        block.text.push('\n');
    }
    close(&mut open, &mut sections);
    sections
}

fn close(open: &mut Option<RawSection>, sections: &mut Vec<RawSection>) {
    if let Some(mut block) = open.take() {
        if block.text.trim().is_empty() {
            return;
        }
        if block.raw_text.ends_with('\n') {
            block.raw_text.pop();
        }
        sections.push(block);
    }
}

/// Everything before the first `//` on the line.
pub(crate) fn strip_comment(line: &str) -> &str {
    line.find("//").map_or(line, |at| &line[..at])
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub(crate) fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
