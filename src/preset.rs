//! Built-in repair jobs.
//!
//! `to-path-string` re-indents the `toPathString(path)` method of
//! `WireManager.js`, which was pasted into the class body at column 0.

use std::path::PathBuf;

use crate::error::{BlockfixError, BlockfixResult};
use crate::replace::{SearchMode, SearchSpec};

/// Unindented method as it appears in the damaged file
pub const TO_PATH_STRING_TARGET: &str = r#"toPathString(path) {
    if (!path || path.length === 0) return '';

    // 경로 단순화: 일직선상의 중간 점 제거
    const simplified = [path[0]];
    for (let i = 1; i < path.length - 1; i++) {
        const prev = simplified[simplified.length - 1];
        const curr = path[i];
        const next = path[i + 1];

        // 세 점이 일직선이면 중간 점 스킵
        const sameX = prev.x === curr.x && curr.x === next.x;
        const sameY = prev.y === curr.y && curr.y === next.y;
        if (!sameX && !sameY) {
            simplified.push(curr);
        }
    }
    if (path.length > 1) simplified.push(path[path.length - 1]);

    // SVG 경로 생성
    let d = `M ${simplified[0].x} ${simplified[0].y}`;
    for (let i = 1; i < simplified.length; i++) {
        d += ` L ${simplified[i].x} ${simplified[i].y}`;
    }
    return d;
}"#;

/// The same method at class-member depth
pub const TO_PATH_STRING_REPLACEMENT: &str = r#"    toPathString(path) {
        if (!path || path.length === 0) return '';

        // 경로 단순화: 일직선상의 중간 점 제거
        const simplified = [path[0]];
        for (let i = 1; i < path.length - 1; i++) {
            const prev = simplified[simplified.length - 1];
            const curr = path[i];
            const next = path[i + 1];

            // 세 점이 일직선이면 중간 점 스킵
            const sameX = prev.x === curr.x && curr.x === next.x;
            const sameY = prev.y === curr.y && curr.y === next.y;
            if (!sameX && !sameY) {
                simplified.push(curr);
            }
        }
        if (path.length > 1) simplified.push(path[path.length - 1]);

        // SVG 경로 생성
        let d = `M ${simplified[0].x} ${simplified[0].y}`;
        for (let i = 1; i < simplified.length; i++) {
            d += ` L ${simplified[i].x} ${simplified[i].y}`;
        }
        return d;
    }"#;

/// A compiled-in job: file location, block and its corrected form
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub default_file: &'static str,
    pub target: &'static str,
    pub start_token: &'static str,
    pub end_delimiter: &'static str,
    pub replacement: &'static str,
}

pub const PRESETS: &[Preset] = &[Preset {
    name: "to-path-string",
    description: "Re-indent WireManager.toPathString by one class level",
    default_file: "js/modules/WireManager.js",
    target: TO_PATH_STRING_TARGET,
    start_token: "toPathString(path) {",
    end_delimiter: "}",
    replacement: TO_PATH_STRING_REPLACEMENT,
}];

/// Preset used when the binary runs without a subcommand
pub const DEFAULT_PRESET: &str = "to-path-string";

impl Preset {
    /// Search spec for the requested strategy
    pub fn search(&self, mode: SearchMode) -> SearchSpec {
        match mode {
            SearchMode::Literal => SearchSpec::literal(self.target),
            SearchMode::Pattern => SearchSpec::pattern(self.start_token, self.end_delimiter),
        }
    }

    pub fn default_path(&self) -> PathBuf {
        PathBuf::from(self.default_file)
    }
}

pub fn find(name: &str) -> BlockfixResult<&'static Preset> {
    PRESETS
        .iter()
        .find(|preset| preset.name == name)
        .ok_or_else(|| BlockfixError::unknown_preset(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replace::{replace_in_content, Outcome};

    #[test]
    fn test_find_known_and_unknown() {
        assert_eq!(find("to-path-string").unwrap().default_file, "js/modules/WireManager.js");
        assert!(matches!(
            find("nope"),
            Err(BlockfixError::UnknownPreset { .. })
        ));
        assert!(find(DEFAULT_PRESET).is_ok());
    }

    #[test]
    fn test_both_strategies_agree_on_preset() {
        let preset = find(DEFAULT_PRESET).unwrap();
        let content = format!("class WireManager {{\n{}\n}}\n", preset.target);

        let (literal, literal_outcome) = replace_in_content(
            &content,
            &preset.search(SearchMode::Literal),
            preset.replacement,
        )
        .unwrap();
        let (pattern, pattern_outcome) = replace_in_content(
            &content,
            &preset.search(SearchMode::Pattern),
            preset.replacement,
        )
        .unwrap();

        assert_eq!(literal_outcome, Outcome::Replaced { replacements: 1 });
        assert_eq!(pattern_outcome, Outcome::Replaced { replacements: 1 });
        assert_eq!(literal, pattern);
    }

    #[test]
    fn test_replacement_does_not_rematch() {
        let preset = find(DEFAULT_PRESET).unwrap();
        for mode in [SearchMode::Literal, SearchMode::Pattern] {
            let (_, outcome) =
                replace_in_content(preset.replacement, &preset.search(mode), preset.replacement)
                    .unwrap();
            assert_eq!(outcome, Outcome::NotFound);
        }
    }
}
