//! Text-level scan for `d.Set("key", ...)` calls, usable without a parsed
//! program.

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::char,
    sequence::delimited,
    IResult,
};
use std::{fs, io, path::Path};

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn setter_key(input: &str) -> IResult<&str, &str> {
    delimited(tag("d.Set(\""), take_while1(is_word_char), char('"'))(input)
}

/// Key set on an indented line, if any. The call has to be preceded by some
/// code on the line and followed by its remaining arguments; with several
/// calls on one line the last one wins.
fn line_setter(line: &str) -> Option<&str> {
    let (body, _) = char::<_, nom::error::Error<&str>>('\t')(line).ok()?;
    body.char_indices()
        .map(|(idx, _)| idx)
        .filter(|idx| *idx > 0)
        .rev()
        .find_map(|idx| match setter_key(&body[idx..]) {
            Ok((rest, key)) if !rest.is_empty() => Some(key),
            _ => None,
        })
}

/// Every key passed to `d.Set` in `source`, in line order.
pub fn find_field_setters(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(line_setter)
        .map(str::to_string)
        .collect()
}

pub fn find_field_setters_in_file(path: &Path) -> io::Result<Vec<String>> {
    let source = fs::read_to_string(path)?;
    Ok(find_field_setters(&source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_keys_on_indented_lines() {
        let source = "func resourceRead(d *schema.ResourceData) error {\n\
                      \tmErr := multierror.Append(nil,\n\
                      \t\td.Set(\"name\", n.Name),\n\
                      \t\td.Set(\"region_id\", region),\n\
                      \t)\n\
                      \tif err := d.Set(\"tags\", tags); err != nil {\n\
                      }\n";
        assert_eq!(
            find_field_setters(source),
            vec!["name", "region_id", "tags"]
        );
    }

    #[test]
    fn ignores_unindented_and_dynamic_keys() {
        let source = "d.Set(\"top\", 1)\n\
                      \t\td.Set(key, value)\n\
                      \td.Set(\"bare\", 1)\n\
                      \t_ = d.Set(\"with-dash\", 1)\n\
                      \t_ = d.Set(\"end\"";
        assert!(find_field_setters(source).is_empty());
    }

    #[test]
    fn last_call_on_a_line_wins() {
        let source = "\tok := d.Set(\"first\", a) == nil && d.Set(\"second\", b) == nil\n";
        assert_eq!(find_field_setters(source), vec!["second"]);
    }

    #[test]
    fn reads_files_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("resource.go");
        fs::write(&path, "\t_ = d.Set(\"status\", s)\n").expect("write source");
        assert_eq!(
            find_field_setters_in_file(&path).expect("scan"),
            vec!["status"]
        );
        assert!(find_field_setters_in_file(&dir.path().join("missing.go")).is_err());
    }
}
