//! Task-name grammar.
//!
//! A task identifier is the network base name optionally extended with
//! suffixes: `<base>[!<params>][^<inst>][#<pathid>]`. The params suffix
//! embeds swept algorithm parameters, the instance suffix distinguishes
//! shuffles/instances of one network, and the path-id suffix disambiguates
//! same-named networks from different source directories.

/// Separator of the algorithm parameters embedded into a task name.
pub const SEP_PARS: char = '!';
/// Separator of the network instance (shuffle) id.
pub const SEP_INST: char = '^';
/// Separator of the path id.
pub const SEP_PATHID: char = '#';
/// Separator of the parts of a job name (`<alg>/<task>`).
pub const SEP_NAMEPART: char = '/';

/// Strip the instance and path-id suffixes from a task identifier,
/// and with `all` also the params suffix.
///
/// The cut happens at the earliest applicable separator, so any suffix
/// ordering yields the plain base name when `all` is set.
pub fn strip_suffixes(name: &str, all: bool) -> &str {
    let end = name
        .char_indices()
        .find(|&(_, c)| c == SEP_INST || c == SEP_PATHID || (all && c == SEP_PARS))
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    &name[..end]
}

/// Components of a parsed task identifier. Suffix fields keep their
/// leading separator and are empty when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskName<'a> {
    /// Network base name.
    pub base: &'a str,
    /// Params suffix (`!...`), empty if none.
    pub params: &'a str,
    /// Instance suffix (`^...`), empty if none.
    pub inst: &'a str,
}

impl<'a> TaskName<'a> {
    /// Parse a task identifier of the canonical `<base>[!params][^inst]` shape.
    pub fn parse(name: &'a str) -> Self {
        let ip = name.find(SEP_PARS);
        let ii = name.find(SEP_INST);
        let base_end = ip.unwrap_or(name.len()).min(ii.unwrap_or(name.len()));
        let params = match ip {
            Some(p) => &name[p..ii.filter(|&i| i > p).unwrap_or(name.len())],
            None => "",
        };
        let inst = match ii {
            Some(i) => &name[i..ip.filter(|&p| p > i).unwrap_or(name.len())],
            None => "",
        };
        TaskName {
            base: &name[..base_end],
            params,
            inst,
        }
    }
}

/// Embed a swept parameter into a task identifier, keeping any existing
/// instance/path-id suffix after the parameter: `net^1` + `k4` → `net!k4^1`.
pub fn embed_param(task: &str, param: &str) -> String {
    let base = strip_suffixes(task, true);
    format!("{}{}{}{}", base, SEP_PARS, param, &task[base.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_keeps_params_by_default() {
        assert_eq!(strip_suffixes("1K10!k7^1", false), "1K10!k7");
        assert_eq!(strip_suffixes("1K10!k7^1", true), "1K10");
    }

    #[test]
    fn strip_all_suffix_orderings() {
        assert_eq!(strip_suffixes("1K10^1!k7.1#1", true), "1K10");
        assert_eq!(strip_suffixes("1K10#2", false), "1K10");
        assert_eq!(strip_suffixes("1K10", true), "1K10");
    }

    #[test]
    fn parse_components() {
        let tn = TaskName::parse("net!e0.30^2");
        assert_eq!(tn.base, "net");
        assert_eq!(tn.params, "!e0.30");
        assert_eq!(tn.inst, "^2");

        let tn = TaskName::parse("net^3");
        assert_eq!(tn.base, "net");
        assert_eq!(tn.params, "");
        assert_eq!(tn.inst, "^3");

        let tn = TaskName::parse("plain");
        assert_eq!(tn.base, "plain");
        assert!(tn.params.is_empty() && tn.inst.is_empty());
    }

    #[test]
    fn embed_keeps_instance_suffix() {
        assert_eq!(embed_param("net^1", "k4"), "net!k4^1");
        assert_eq!(embed_param("net", "e0.05"), "net!e0.05");
    }
}
