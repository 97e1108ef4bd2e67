//! Score parsing, categories and PB report formatting.

use crate::error::CommandError;
use std::fmt;
use std::str::FromStr;

/// Scores above this are rejected as implausible.
pub const MAX_SCORE: i64 = 1_000_000;
/// Starting level assumed when a submission names none.
pub const DEFAULT_LEVEL: u8 = 18;
/// Secondary NTSC category reported alongside the default one.
pub const LEVEL_19: u8 = 19;
/// Highest valid starting level.
pub const MAX_LEVEL: u8 = 29;

pub const INVALID_PB: &str = "Invalid PB.";
pub const IMPLAUSIBLE_PB: &str = "You wish, kid >.>";
pub const INVALID_LEVEL: &str = "Invalid level.";
pub const NO_PB: &str = "User has not set a PB.";

/// Console variant a score was achieved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleType {
    Ntsc,
    Pal,
}

impl ConsoleType {
    /// Storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ntsc => "ntsc",
            Self::Pal => "pal",
        }
    }

    /// Indefinite article for the display name ("an NTSC", "a PAL").
    fn article(self) -> &'static str {
        match self {
            Self::Ntsc => "an",
            Self::Pal => "a",
        }
    }
}

impl FromStr for ConsoleType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ntsc") {
            Ok(Self::Ntsc)
        } else if s.eq_ignore_ascii_case("pal") {
            Ok(Self::Pal)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for ConsoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ntsc => "NTSC",
            Self::Pal => "PAL",
        })
    }
}

/// Format a score with comma thousands separators.
pub fn format_score(score: i64) -> String {
    let digits = score.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if score < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whether `token` reads as an integer once separators are removed.
fn is_numeric(token: &str) -> bool {
    let stripped = token.replace(',', "");
    let digits = stripped.strip_prefix('-').unwrap_or(&stripped);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Parse a score token such as `"100,000"`.
///
/// Returns `Ok(None)` when the token isn't a number at all, so the caller
/// can answer with usage instead of a value error.
pub fn parse_score(token: &str) -> Result<Option<i64>, CommandError> {
    if !is_numeric(token) {
        return Ok(None);
    }
    let score: i64 = match token.replace(',', "").parse() {
        Ok(score) => score,
        // Too many digits for i64, which is certainly too many for a score.
        Err(_) if !token.starts_with('-') => {
            return Err(CommandError::InvalidArgument(IMPLAUSIBLE_PB.to_string()));
        }
        Err(_) => return Err(CommandError::InvalidArgument(INVALID_PB.to_string())),
    };
    if score < 0 {
        return Err(CommandError::InvalidArgument(INVALID_PB.to_string()));
    }
    if score > MAX_SCORE {
        return Err(CommandError::InvalidArgument(IMPLAUSIBLE_PB.to_string()));
    }
    Ok(Some(score))
}

/// Parse a starting level in `0..=MAX_LEVEL`.
pub fn parse_level(token: &str) -> Result<u8, CommandError> {
    token
        .parse::<i64>()
        .ok()
        .filter(|level| (0..=i64::from(MAX_LEVEL)).contains(level))
        .and_then(|level| u8::try_from(level).ok())
        .ok_or_else(|| CommandError::InvalidArgument(INVALID_LEVEL.to_string()))
}

/// A validated `setpb` submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbSubmission {
    pub score: i64,
    pub console: ConsoleType,
    pub level: u8,
}

impl PbSubmission {
    /// Parse `<score> [NTSC|PAL] [level]`, or `<score> [level]`.
    pub fn parse(tokens: &[&str]) -> Result<Self, CommandError> {
        let Some(score_token) = tokens.first() else {
            return Err(CommandError::Usage);
        };
        let Some(score) = parse_score(score_token)? else {
            return Err(CommandError::Usage);
        };

        let mut console = ConsoleType::Ntsc;
        let mut level = DEFAULT_LEVEL;

        if let Some(token) = tokens.get(1) {
            if let Ok(parsed) = token.parse::<ConsoleType>() {
                console = parsed;
                if let Some(level_token) = tokens.get(2) {
                    level = parse_level(level_token)?;
                }
            } else if is_numeric(token) {
                level = parse_level(token)?;
            } else {
                return Err(CommandError::InvalidArgument(format!(
                    "Invalid PB type: {}",
                    token
                )));
            }
        }

        Ok(Self {
            score,
            console,
            level,
        })
    }

    /// Category wording for the confirmation, e.g. `NTSC level 19`.
    pub fn category(&self) -> String {
        if self.level == DEFAULT_LEVEL {
            self.console.to_string()
        } else {
            format!("{} level {}", self.console, self.level)
        }
    }
}

/// The current PBs a report is built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentPbs {
    pub ntsc: Option<i64>,
    pub ntsc_19: Option<i64>,
    pub pal: Option<i64>,
}

impl CurrentPbs {
    /// Describe the PBs as the tail of "<name> has ...", or `None` if there are none.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::with_capacity(2);

        let ntsc = ConsoleType::Ntsc;
        match (self.ntsc, self.ntsc_19) {
            (Some(main), Some(nineteen)) => parts.push(format!(
                "{} {} PB of {} ({} 19 start)",
                ntsc.article(),
                ntsc,
                format_score(main),
                format_score(nineteen)
            )),
            (Some(main), None) => parts.push(format!(
                "{} {} PB of {}",
                ntsc.article(),
                ntsc,
                format_score(main)
            )),
            (None, Some(nineteen)) => parts.push(format!(
                "{} {} level 19 PB of {}",
                ntsc.article(),
                ntsc,
                format_score(nineteen)
            )),
            (None, None) => {}
        }

        if let Some(pal) = self.pal {
            let console = ConsoleType::Pal;
            parts.push(format!(
                "{} {} PB of {}",
                console.article(),
                console,
                format_score(pal)
            ));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" and "))
        }
    }
}

/// Describe the newest PB on each console, in any category.
///
/// Used when none of the report categories has a PB. `latest` is ordered
/// newest first as `(console, starting level, score)`.
pub fn describe_latest<I>(latest: I) -> Option<String>
where
    I: IntoIterator<Item = (ConsoleType, u8, i64)>,
{
    let mut ntsc = None;
    let mut pal = None;
    for (console, level, score) in latest {
        let slot = match console {
            ConsoleType::Ntsc => &mut ntsc,
            ConsoleType::Pal => &mut pal,
        };
        slot.get_or_insert((level, score));
    }

    let parts: Vec<String> = [(ConsoleType::Ntsc, ntsc), (ConsoleType::Pal, pal)]
        .into_iter()
        .filter_map(|(console, pb)| {
            let (level, score) = pb?;
            let category = PbSubmission {
                score,
                console,
                level,
            }
            .category();
            Some(format!(
                "{} {} PB of {}",
                console.article(),
                category,
                format_score(score)
            ))
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[track_caller]
    fn assert_invalid<T: fmt::Debug>(result: Result<T, CommandError>, expected: &str) {
        match result {
            Err(CommandError::InvalidArgument(message)) => assert_eq!(message, expected),
            other => panic!("expected InvalidArgument({expected:?}), got {other:?}"),
        }
    }

    #[track_caller]
    fn assert_usage<T: fmt::Debug>(result: Result<T, CommandError>) {
        assert!(
            matches!(result, Err(CommandError::Usage)),
            "expected Usage, got {result:?}"
        );
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0), "0");
        assert_eq!(format_score(999), "999");
        assert_eq!(format_score(1000), "1,000");
        assert_eq!(format_score(100000), "100,000");
        assert_eq!(format_score(1234567), "1,234,567");
        assert_eq!(format_score(-5000), "-5,000");
    }

    proptest! {
        #[test]
        fn test_separated_scores_round_trip(n in 0..=MAX_SCORE) {
            let shown = format_score(n);
            let parsed = parse_score(&shown).unwrap();
            prop_assert_eq!(parsed, Some(n));
            prop_assert_eq!(format_score(parsed.unwrap()), shown);
        }

        #[test]
        fn test_unseparated_scores_parse(n in 0..=MAX_SCORE) {
            prop_assert_eq!(parse_score(&n.to_string()).unwrap(), Some(n));
        }
    }

    #[test]
    fn test_parse_score_errors() {
        assert_eq!(parse_score("asdf").unwrap(), None);
        assert_invalid(parse_score("-5"), INVALID_PB);
        assert_invalid(parse_score("-100,000"), INVALID_PB);
        assert_invalid(parse_score("1500000"), IMPLAUSIBLE_PB);
        assert_invalid(parse_score("99999999999999999999999"), IMPLAUSIBLE_PB);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("0").unwrap(), 0);
        assert_eq!(parse_level("29").unwrap(), 29);
        for bad in ["30", "-5", "nineteen", ""] {
            assert_invalid(parse_level(bad), INVALID_LEVEL);
        }
    }

    #[test]
    fn test_submission_defaults() {
        let pb = PbSubmission::parse(&["100,000"]).unwrap();
        assert_eq!(
            pb,
            PbSubmission {
                score: 100000,
                console: ConsoleType::Ntsc,
                level: DEFAULT_LEVEL
            }
        );
        assert_eq!(pb.category(), "NTSC");
    }

    #[test]
    fn test_submission_console_and_level() {
        let pb = PbSubmission::parse(&["100000", "pal"]).unwrap();
        assert_eq!(pb.console, ConsoleType::Pal);
        assert_eq!(pb.category(), "PAL");

        let pb = PbSubmission::parse(&["100000", "NTSC", "19"]).unwrap();
        assert_eq!(pb.level, 19);
        assert_eq!(pb.category(), "NTSC level 19");

        let pb = PbSubmission::parse(&["100000", "29"]).unwrap();
        assert_eq!(pb.console, ConsoleType::Ntsc);
        assert_eq!(pb.level, 29);
    }

    #[test]
    fn test_submission_errors() {
        assert_usage(PbSubmission::parse(&[]));
        assert_usage(PbSubmission::parse(&["asdf"]));
        assert_invalid(PbSubmission::parse(&["100000", "NTSC", "30"]), INVALID_LEVEL);
        assert_invalid(PbSubmission::parse(&["100000", "NTSC", "-5"]), INVALID_LEVEL);
        assert_invalid(PbSubmission::parse(&["100000", "35"]), INVALID_LEVEL);
        assert_invalid(
            PbSubmission::parse(&["100000", "foo"]),
            "Invalid PB type: foo",
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(CurrentPbs::default().describe(), None);

        let ntsc_only = CurrentPbs {
            ntsc: Some(100000),
            ..Default::default()
        };
        assert_eq!(ntsc_only.describe().unwrap(), "an NTSC PB of 100,000");

        let with_19 = CurrentPbs {
            ntsc: Some(600000),
            ntsc_19: Some(100000),
            pal: None,
        };
        assert_eq!(
            with_19.describe().unwrap(),
            "an NTSC PB of 600,000 (100,000 19 start)"
        );

        let only_19 = CurrentPbs {
            ntsc_19: Some(300000),
            ..Default::default()
        };
        assert_eq!(
            only_19.describe().unwrap(),
            "an NTSC level 19 PB of 300,000"
        );

        let both = CurrentPbs {
            ntsc: Some(200000),
            ntsc_19: None,
            pal: Some(100000),
        };
        assert_eq!(
            both.describe().unwrap(),
            "an NTSC PB of 200,000 and a PAL PB of 100,000"
        );

        let pal_only = CurrentPbs {
            pal: Some(100000),
            ..Default::default()
        };
        assert_eq!(pal_only.describe().unwrap(), "a PAL PB of 100,000");
    }

    #[test]
    fn test_describe_latest() {
        assert_eq!(describe_latest(Vec::<(ConsoleType, u8, i64)>::new()), None);

        let pal_19 = [(ConsoleType::Pal, 19, 100000)];
        assert_eq!(
            describe_latest(pal_19).unwrap(),
            "a PAL level 19 PB of 100,000"
        );

        let mixed = [
            (ConsoleType::Pal, 19, 150000),
            (ConsoleType::Ntsc, 12, 80000),
            (ConsoleType::Ntsc, 15, 90000),
        ];
        assert_eq!(
            describe_latest(mixed).unwrap(),
            "an NTSC level 12 PB of 80,000 and a PAL level 19 PB of 150,000"
        );
    }
}
