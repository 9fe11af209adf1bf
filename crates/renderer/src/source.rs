//! Splits generated shader blobs into their vertex and fragment stages.
//!
//! The generation service returns both stages in one text blob:
//!
//! ```text
//! attribute vec2 a_position;
//! void main() { gl_Position = vec4(a_position, 0.0, 1.0); }
//! // Fragment Shader
//! precision mediump float;
//! void main() { gl_FragColor = vec4(1.0); }
//! ```
//!
//! The separator has to sit on a line of its own and appear exactly once.

use crate::error::FormatError;
use crate::types::StageKind;

/// Vertex and fragment sources, both trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSource {
    pub vertex: String,
    pub fragment: String,
}

impl SplitSource {
    pub fn stage(&self, kind: StageKind) -> &str {
        match kind {
            StageKind::Vertex => &self.vertex,
            StageKind::Fragment => &self.fragment,
        }
    }
}

/// Divides `blob` at the line equal to `sentinel`.
///
/// Trailing whitespace (including `\r`) on a candidate line is ignored; the
/// comparison is otherwise exact and case-sensitive.
pub fn split_shader_source(blob: &str, sentinel: &str) -> Result<SplitSource, FormatError> {
    let sentinel = sentinel.trim_end();
    let mut offset = 0;
    let mut occurrences = 0;
    let mut boundary = None;

    for line in blob.split_inclusive('\n') {
        if line.trim_end() == sentinel {
            occurrences += 1;
            boundary.get_or_insert((offset, offset + line.len()));
        }
        offset += line.len();
    }

    let (start, end) = match (occurrences, boundary) {
        (1, Some(range)) => range,
        (0, _) | (_, None) => return Err(FormatError::MissingSentinel),
        (count, _) => return Err(FormatError::DuplicateSentinel { count }),
    };

    let vertex = blob[..start].trim();
    if vertex.is_empty() {
        return Err(FormatError::EmptyStage {
            stage: StageKind::Vertex,
        });
    }
    let fragment = blob[end..].trim();
    if fragment.is_empty() {
        return Err(FormatError::EmptyStage {
            stage: StageKind::Fragment,
        });
    }

    Ok(SplitSource {
        vertex: vertex.to_string(),
        fragment: fragment.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_SENTINEL;

    const VERTEX: &str = "attribute vec2 a_position;\nvoid main() { gl_Position = vec4(a_position, 0.0, 1.0); }";
    const FRAGMENT: &str = "precision mediump float;\nvoid main() { gl_FragColor = vec4(1.0); }";

    fn blob(vertex: &str, fragment: &str) -> String {
        format!("{vertex}\n{DEFAULT_SENTINEL}\n{fragment}")
    }

    #[test]
    fn returns_trimmed_stages() {
        let sides = [
            (VERTEX, FRAGMENT),
            ("  \n\tvoid main(){}  \n", "\n void main(){ gl_FragColor=vec4(1); }\n\n"),
            ("x", "y"),
        ];
        for (vertex, fragment) in sides {
            let split = split_shader_source(&blob(vertex, fragment), DEFAULT_SENTINEL)
                .expect("valid blob");
            assert_eq!(split.vertex, vertex.trim());
            assert_eq!(split.fragment, fragment.trim());
        }
    }

    #[test]
    fn accepts_custom_sentinel_and_crlf() {
        let input = "void main(){} \r\n// SENTINEL\r\nvoid main(){ gl_FragColor=vec4(1); }\r\n";
        let split = split_shader_source(input, "// SENTINEL").unwrap();
        assert_eq!(split.vertex, "void main(){}");
        assert_eq!(split.fragment, "void main(){ gl_FragColor=vec4(1); }");
        assert_eq!(split.stage(StageKind::Vertex), "void main(){}");
    }

    #[test]
    fn rejects_missing_sentinel() {
        let err = split_shader_source("void main(){}\nvoid main(){}", DEFAULT_SENTINEL).unwrap_err();
        assert_eq!(err, FormatError::MissingSentinel);

        // Case matters and the separator must own its line.
        let lower = format!("{VERTEX}\n// fragment shader\n{FRAGMENT}");
        assert_eq!(
            split_shader_source(&lower, DEFAULT_SENTINEL).unwrap_err(),
            FormatError::MissingSentinel
        );
        let inline = format!("{VERTEX} {DEFAULT_SENTINEL}\n{FRAGMENT}");
        assert_eq!(
            split_shader_source(&inline, DEFAULT_SENTINEL).unwrap_err(),
            FormatError::MissingSentinel
        );
    }

    #[test]
    fn rejects_repeated_sentinel() {
        let twice = format!("{VERTEX}\n{DEFAULT_SENTINEL}\n{FRAGMENT}\n{DEFAULT_SENTINEL}\n{FRAGMENT}");
        assert_eq!(
            split_shader_source(&twice, DEFAULT_SENTINEL).unwrap_err(),
            FormatError::DuplicateSentinel { count: 2 }
        );

        let thrice = format!("{DEFAULT_SENTINEL}\n{DEFAULT_SENTINEL}\n{DEFAULT_SENTINEL}");
        assert_eq!(
            split_shader_source(&thrice, DEFAULT_SENTINEL).unwrap_err(),
            FormatError::DuplicateSentinel { count: 3 }
        );
    }

    #[test]
    fn rejects_blank_stages() {
        for (vertex, fragment, stage) in [
            ("", FRAGMENT, StageKind::Vertex),
            ("  \n\t ", FRAGMENT, StageKind::Vertex),
            (VERTEX, "", StageKind::Fragment),
            (VERTEX, "\n   \n", StageKind::Fragment),
        ] {
            assert_eq!(
                split_shader_source(&blob(vertex, fragment), DEFAULT_SENTINEL).unwrap_err(),
                FormatError::EmptyStage { stage }
            );
        }

        let trailing = format!("{VERTEX}\n{DEFAULT_SENTINEL}");
        assert_eq!(
            split_shader_source(&trailing, DEFAULT_SENTINEL).unwrap_err(),
            FormatError::EmptyStage {
                stage: StageKind::Fragment
            }
        );
    }
}
