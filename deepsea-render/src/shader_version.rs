//! Shader version selection (spec §6): picking the best-matching
//! precompiled shader variant out of a module's embedded version list.

/// One parsed `"<shader_language>-<major>.<minor>"` version string.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ParsedVersion {
    language: String,
    major: u32,
    minor: u32,
}

fn parse(version: &str) -> Option<ParsedVersion> {
    let (language, number) = version.split_once('-')?;
    let (major, minor) = number.split_once('.')?;
    Some(ParsedVersion { language: language.to_string(), major: major.parse().ok()?, minor: minor.parse().ok()? })
}

/// Returns the highest version in `versions` whose shader language matches
/// `renderer_id` and whose `(major, minor)` is `<= max_version`, or `None`
/// if nothing qualifies.
pub fn choose_shader_version<'a>(renderer_id: &str, max_version: (u32, u32), versions: &[&'a str]) -> Option<&'a str> {
    versions
        .iter()
        .filter_map(|&candidate| parse(candidate).map(|parsed| (candidate, parsed)))
        .filter(|(_, parsed)| parsed.language == renderer_id && (parsed.major, parsed.minor) <= max_version)
        .max_by_key(|(_, parsed)| (parsed.major, parsed.minor))
        .map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_highest_qualifying_version() {
        let versions = ["glsl-1.0", "glsl-4.5", "glsl-3.3", "essl-3.2"];
        assert_eq!(choose_shader_version("glsl", (4, 0), &versions), Some("glsl-3.3"));
        assert_eq!(choose_shader_version("glsl", (4, 5), &versions), Some("glsl-4.5"));
    }

    #[test]
    fn returns_none_when_nothing_qualifies() {
        let versions = ["glsl-4.5"];
        assert_eq!(choose_shader_version("glsl", (1, 0), &versions), None);
        assert_eq!(choose_shader_version("essl", (4, 5), &versions), None);
    }
}
