use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::tiers::{TierColor, TierDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    NoTiers,
    NonAscendingValue,
}

#[derive(Debug, Clone)]
pub struct TierCompileError {
    pub code: TierErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for TierCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for TierCompileError {}

/// Reads a tier pack from disk. Tier order in the document is the tier order
/// of the table: the lowest tier comes first.
pub fn load_tier_defs(path: &Path) -> Result<Vec<TierDef>, TierCompileError> {
    let raw = fs::read_to_string(path).map_err(|source| TierCompileError {
        code: TierErrorCode::ReadFile,
        message: format!("failed to read tier defs: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    parse_tier_defs(path, &raw)
}

pub fn parse_tier_defs(path: &Path, raw: &str) -> Result<Vec<TierDef>, TierCompileError> {
    let document = Document::parse(raw).map_err(|source| TierCompileError {
        code: TierErrorCode::XmlMalformed,
        message: format!("XML parse failed: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;

    let root = document.root_element();
    if root.tag_name().name() != "TierDefs" {
        return Err(error_at(
            &document,
            path,
            TierErrorCode::InvalidRoot,
            format!(
                "expected root element <TierDefs>, found <{}>",
                root.tag_name().name()
            ),
            root,
        ));
    }

    let mut defs = Vec::new();
    for child in root.children().filter(Node::is_element) {
        if child.tag_name().name() != "TierDef" {
            return Err(error_at(
                &document,
                path,
                TierErrorCode::UnknownField,
                format!(
                    "unexpected element <{}> under <TierDefs>",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        defs.push(parse_tier_def(&document, path, child)?);
    }

    if defs.is_empty() {
        return Err(TierCompileError {
            code: TierErrorCode::NoTiers,
            message: "tier pack defines no <TierDef> entries".to_string(),
            file_path: path.to_path_buf(),
            location: None,
        });
    }
    for window in defs.windows(2) {
        if window[1].value <= window[0].value {
            return Err(TierCompileError {
                code: TierErrorCode::NonAscendingValue,
                message: format!(
                    "tier values must be strictly ascending; {} follows {}",
                    window[1].value, window[0].value
                ),
                file_path: path.to_path_buf(),
                location: None,
            });
        }
    }
    Ok(defs)
}

fn parse_tier_def(
    document: &Document<'_>,
    path: &Path,
    node: Node<'_, '_>,
) -> Result<TierDef, TierCompileError> {
    let mut value: Option<u32> = None;
    let mut color: Option<TierColor> = None;
    let mut score: Option<u32> = None;

    for field in node.children().filter(Node::is_element) {
        let name = field.tag_name().name();
        let text = field.text().unwrap_or("").trim();
        match name {
            "value" => {
                if value.is_some() {
                    return Err(error_at(
                        document,
                        path,
                        TierErrorCode::DuplicateField,
                        "duplicate <value> in TierDef".to_string(),
                        field,
                    ));
                }
                value = Some(parse_u32(document, path, field, name, text)?);
            }
            "color" => {
                if color.is_some() {
                    return Err(error_at(
                        document,
                        path,
                        TierErrorCode::DuplicateField,
                        "duplicate <color> in TierDef".to_string(),
                        field,
                    ));
                }
                color = Some(parse_color(document, path, field, text)?);
            }
            "score" => {
                if score.is_some() {
                    return Err(error_at(
                        document,
                        path,
                        TierErrorCode::DuplicateField,
                        "duplicate <score> in TierDef".to_string(),
                        field,
                    ));
                }
                score = Some(parse_u32(document, path, field, name, text)?);
            }
            other => {
                return Err(error_at(
                    document,
                    path,
                    TierErrorCode::UnknownField,
                    format!("unknown TierDef field <{other}>"),
                    field,
                ));
            }
        }
    }

    let value = value.ok_or_else(|| error_at(
        document,
        path,
        TierErrorCode::MissingField,
        "TierDef is missing required field <value>".to_string(),
        node,
    ))?;
    let color = color.ok_or_else(|| error_at(
        document,
        path,
        TierErrorCode::MissingField,
        "TierDef is missing required field <color>".to_string(),
        node,
    ))?;

    Ok(TierDef {
        value,
        color,
        // A tier scores its displayed value unless the pack overrides it.
        score: score.unwrap_or(value),
    })
}

fn parse_u32(
    document: &Document<'_>,
    path: &Path,
    node: Node<'_, '_>,
    field: &str,
    text: &str,
) -> Result<u32, TierCompileError> {
    text.parse::<u32>().map_err(|_| {
        error_at(
            document,
            path,
            TierErrorCode::InvalidValue,
            format!("invalid <{field}> '{text}' (expected a non-negative integer)"),
            node,
        )
    })
}

fn parse_color(
    document: &Document<'_>,
    path: &Path,
    node: Node<'_, '_>,
    text: &str,
) -> Result<TierColor, TierCompileError> {
    let invalid = || {
        error_at(
            document,
            path,
            TierErrorCode::InvalidValue,
            format!("invalid <color> '{text}' (expected #RRGGBB)"),
            node,
        )
    };
    let hex = text.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 {
        return Err(invalid());
    }
    let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
    let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
    let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
    Ok(TierColor { r, g, b })
}

fn error_at(
    document: &Document<'_>,
    path: &Path,
    code: TierErrorCode,
    message: String,
    node: Node<'_, '_>,
) -> TierCompileError {
    let pos = document.text_pos_at(node.range().start);
    TierCompileError {
        code,
        message,
        file_path: path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const VALID_PACK: &str = r#"
<TierDefs>
  <TierDef>
    <value>2</value>
    <color>#F2545B</color>
  </TierDef>
  <TierDef>
    <value>4</value>
    <color>#19323C</color>
    <score>8</score>
  </TierDef>
</TierDefs>
"#;

    fn parse(raw: &str) -> Result<Vec<TierDef>, TierCompileError> {
        parse_tier_defs(Path::new("test.xml"), raw)
    }

    #[test]
    fn valid_pack_parses_in_document_order() {
        let defs = parse(VALID_PACK).expect("defs");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].value, 2);
        assert_eq!(
            defs[0].color,
            TierColor {
                r: 0xF2,
                g: 0x54,
                b: 0x5B
            }
        );
        // Score defaults to the displayed value, overridable per tier.
        assert_eq!(defs[0].score, 2);
        assert_eq!(defs[1].score, 8);
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = parse("<Tiers></Tiers>").expect_err("err");
        assert_eq!(err.code, TierErrorCode::InvalidRoot);
    }

    #[test]
    fn unknown_field_reports_a_location() {
        let raw = "<TierDefs><TierDef><value>2</value><color>#000000</color><speed>3</speed></TierDef></TierDefs>";
        let err = parse(raw).expect_err("err");
        assert_eq!(err.code, TierErrorCode::UnknownField);
        assert!(err.location.is_some());
        assert!(err.message.contains("speed"));
    }

    #[test]
    fn missing_and_duplicate_fields_are_rejected() {
        let missing = parse("<TierDefs><TierDef><value>2</value></TierDef></TierDefs>")
            .expect_err("missing");
        assert_eq!(missing.code, TierErrorCode::MissingField);

        let duplicated = parse(
            "<TierDefs><TierDef><value>2</value><value>4</value><color>#000000</color></TierDef></TierDefs>",
        )
        .expect_err("duplicate");
        assert_eq!(duplicated.code, TierErrorCode::DuplicateField);
    }

    #[test]
    fn bad_color_and_bad_value_are_invalid_values() {
        let bad_color =
            parse("<TierDefs><TierDef><value>2</value><color>red</color></TierDef></TierDefs>")
                .expect_err("color");
        assert_eq!(bad_color.code, TierErrorCode::InvalidValue);

        let bad_value =
            parse("<TierDefs><TierDef><value>two</value><color>#000000</color></TierDef></TierDefs>")
                .expect_err("value");
        assert_eq!(bad_value.code, TierErrorCode::InvalidValue);
    }

    #[test]
    fn values_must_ascend() {
        let raw = "<TierDefs>\
            <TierDef><value>4</value><color>#000000</color></TierDef>\
            <TierDef><value>2</value><color>#FFFFFF</color></TierDef>\
            </TierDefs>";
        let err = parse(raw).expect_err("err");
        assert_eq!(err.code, TierErrorCode::NonAscendingValue);
    }

    #[test]
    fn empty_pack_is_rejected() {
        let err = parse("<TierDefs></TierDefs>").expect_err("err");
        assert_eq!(err.code, TierErrorCode::NoTiers);
    }

    #[test]
    fn load_reads_from_disk_and_reports_read_failures() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(VALID_PACK.as_bytes()).expect("write");
        let defs = load_tier_defs(file.path()).expect("defs");
        assert_eq!(defs.len(), 2);

        let err = load_tier_defs(Path::new("/definitely/not/here.xml")).expect_err("err");
        assert_eq!(err.code, TierErrorCode::ReadFile);
    }
}
