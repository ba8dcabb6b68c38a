//! "Did you mean" hints for match errors.

use cliscript_core::error::MatchError;
use cliscript_core::resolver::ResolvedProgram;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Best fuzzy match for `input` among `candidates`.
pub fn closest<'a, I>(candidates: I, input: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let matcher = SkimMatcherV2::default();

    candidates
        .into_iter()
        .filter(|candidate| *candidate != input)
        .filter_map(|candidate| {
            matcher
                .fuzzy_match(candidate, input)
                .map(|score| (score, candidate))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, candidate)| candidate)
}

/// A hint line for `error`, if a declared name is close to what was typed.
#[must_use]
pub fn hint(program: &ResolvedProgram, error: &MatchError) -> Option<String> {
    match error {
        MatchError::NoSuchCommand { name: Some(name) } => {
            let commands = program.commands.iter().map(|command| command.label());
            closest(commands, name).map(|command| format!("Did you mean `{command}`?"))
        }
        MatchError::UnknownFlag { flag } if flag.starts_with("--") => {
            let flags = program
                .root_options
                .iter()
                .chain(program.commands.iter().flat_map(|command| &command.options))
                .chain(program.default_command.iter().flat_map(|command| &command.options))
                .filter_map(|option| option.long.as_deref());
            let typed = flag.split_once('=').map_or(flag.as_str(), |(flag, _)| flag);
            closest(flags, typed).map(|flag| format!("Did you mean `{flag}`?"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliscript_core::resolver::compile;

    fn program() -> ResolvedProgram {
        compile(
            "cmd copy\n--recursive [bool]\n-> f.copy($recursive)\ncmd list\n-> f.list()\ncmd clone\n-> f.clone()",
        )
        .unwrap()
    }

    #[test]
    fn test_closest_command() {
        assert_eq!(closest(["copy", "list", "clone"], "cpy"), Some("copy"));
        assert_eq!(closest(["copy", "list"], "zzz"), None);
    }

    #[test]
    fn test_hint_for_unknown_command() {
        let error = MatchError::NoSuchCommand {
            name: Some("lst".to_string()),
        };
        assert_eq!(hint(&program(), &error), Some("Did you mean `list`?".to_string()));
    }

    #[test]
    fn test_hint_for_unknown_flag() {
        let error = MatchError::UnknownFlag {
            flag: "--recurse".to_string(),
        };
        assert_eq!(
            hint(&program(), &error),
            Some("Did you mean `--recursive`?".to_string())
        );
    }

    #[test]
    fn test_no_hint_for_other_errors() {
        let error = MatchError::MissingArgument {
            name: "source".to_string(),
        };
        assert_eq!(hint(&program(), &error), None);
        assert_eq!(hint(&program(), &MatchError::NoSuchCommand { name: None }), None);
    }
}
