//! Step-specific command-line flags and their parsed values

use std::collections::BTreeMap;
use std::str::FromStr;

use clap::{Arg, ArgAction, ArgMatches, Command};
use eyre::{Result, eyre};
use tracing::debug;

/// A command-line flag declared by a transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOption {
    /// Long flag name, without the leading `--`
    pub name: &'static str,
    pub help: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
    /// Boolean switch taking no value
    pub is_flag: bool,
}

impl CliOption {
    /// A `--name <VALUE>` option
    pub fn value(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            required: false,
            default: None,
            is_flag: false,
        }
    }

    /// A `--name` switch
    pub fn flag(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            required: false,
            default: None,
            is_flag: true,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    /// Build the clap argument for this option
    pub fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.name).long(self.name).help(self.help);
        if self.is_flag {
            return arg.action(ArgAction::SetTrue);
        }

        let arg = arg.action(ArgAction::Set).required(self.required);
        match self.default {
            Some(default) => arg.default_value(default),
            None => arg,
        }
    }

    /// Parse `args` against a set of declared options
    ///
    /// `args` excludes the program name, e.g. `["--limit", "10"]`.
    pub fn parse(
        command: &'static str,
        about: &'static str,
        options: &[CliOption],
        args: &[String],
    ) -> Result<ExtraOptions, clap::Error> {
        debug!(%command, ?args, "CliOption::parse: called");
        let matches = Command::new(command)
            .about(about)
            .no_binary_name(true)
            .args(options.iter().map(CliOption::to_arg))
            .try_get_matches_from(args)?;
        Ok(ExtraOptions::from_matches(options, &matches))
    }
}

/// Values of a transformation's declared flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraOptions {
    values: BTreeMap<String, String>,
}

impl ExtraOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the declared options present in `matches`
    pub fn from_matches(options: &[CliOption], matches: &ArgMatches) -> Self {
        let mut extra = Self::new();
        for option in options {
            if option.is_flag {
                extra.insert(option.name, matches.get_flag(option.name).to_string());
            } else if let Some(value) = matches.get_one::<String>(option.name) {
                extra.insert(option.name, value.clone());
            }
        }
        extra
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Parse the value of `name`, if present
    pub fn get_parsed<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| raw.parse::<T>().map_err(|e| eyre!("Invalid value '{}' for --{}: {}", raw, name, e)))
            .transpose()
    }

    /// Whether the switch `name` was given
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn declared() -> Vec<CliOption> {
        vec![
            CliOption::value("limit", "Maximum rows"),
            CliOption::value("mode", "Run mode").default_value("fast"),
            CliOption::flag("dry-run", "Do not write"),
        ]
    }

    #[test]
    fn test_parse_values_and_defaults() {
        let extra = CliOption::parse("step", "A step", &declared(), &args(&["--limit", "10"])).unwrap();

        assert_eq!(extra.get("limit"), Some("10"));
        assert_eq!(extra.get("mode"), Some("fast"));
        assert!(!extra.flag("dry-run"));
        assert_eq!(extra.get_parsed::<usize>("limit").unwrap(), Some(10));
    }

    #[test]
    fn test_parse_flag() {
        let extra = CliOption::parse("step", "A step", &declared(), &args(&["--dry-run"])).unwrap();
        assert!(extra.flag("dry-run"));
        assert_eq!(extra.get("limit"), None);
    }

    #[test]
    fn test_required_option_missing() {
        let options = vec![CliOption::value("source", "Source table").required()];
        assert!(CliOption::parse("step", "A step", &options, &[]).is_err());
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(CliOption::parse("step", "A step", &declared(), &args(&["--nope"])).is_err());
    }

    #[test]
    fn test_get_parsed_invalid() {
        let mut extra = ExtraOptions::new();
        extra.insert("limit", "ten");

        let err = extra.get_parsed::<usize>("limit").unwrap_err();
        assert!(err.to_string().contains("--limit"));
        assert_eq!(extra.get_parsed::<usize>("missing").unwrap(), None);
    }
}
