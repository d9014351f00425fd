use serde::Serialize;

use crate::analysis::urn::Urn;
use crate::error::TypeError;
use crate::models::Ecosystem;

/// Decomposed view of an analysis type URN.
///
/// The namespace-specific string follows:
///
/// ```text
/// SS := collector ("," action)* ("!" ecosystem ("," action)*)? ("." format)?
/// ```
///
/// An enricher is written `<parent urn>+urn:<framework>:<SS>`; its own
/// segment may not name an ecosystem, which is always inherited from the
/// parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeComponents {
    pub framework: String,
    pub collector: String,
    pub collector_actions: Vec<String>,
    pub ecosystem: Option<Ecosystem>,
    pub ecosystem_actions: Vec<String>,
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<TypeComponents>>,
}

/// One `SS` production, before enricher merging.
struct Segment {
    collector: String,
    collector_actions: Vec<String>,
    ecosystem: Option<Ecosystem>,
    ecosystem_actions: Vec<String>,
    format: Option<String>,
}

impl TypeComponents {
    /// Parse a full type URN, including any `+` enricher suffix.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        if let Some((parent, own)) = input.rsplit_once('+') {
            let parent = Self::parse(parent)?;
            let own_urn = Urn::parse(own)?;
            let segment = parse_segment(own_urn.nss())?;
            if segment.ecosystem.is_some() {
                return Err(TypeError::InvalidComponents {
                    input: input.to_string(),
                    reason: "an enricher cannot declare its own ecosystem".to_string(),
                });
            }
            return Ok(Self {
                framework: own_urn.nid().to_ascii_lowercase(),
                collector: segment.collector,
                collector_actions: segment.collector_actions,
                ecosystem: parent.ecosystem,
                ecosystem_actions: parent.ecosystem_actions.clone(),
                format: segment.format.or_else(|| parent.format.clone()),
                parent: Some(Box::new(parent)),
            });
        }

        let urn = Urn::parse(input)?;
        let segment = parse_segment(urn.nss())?;
        Ok(Self {
            framework: urn.nid().to_ascii_lowercase(),
            collector: segment.collector,
            collector_actions: segment.collector_actions,
            ecosystem: segment.ecosystem,
            ecosystem_actions: segment.ecosystem_actions,
            format: segment.format,
            parent: None,
        })
    }

    /// Recompose the canonical, normalized URN.
    pub fn to_urn(&self) -> Result<Urn, TypeError> {
        let own = self.own_nss();
        match &self.parent {
            None => Ok(Urn::new(&self.framework, &own)?.normalize()),
            Some(parent) => {
                let parent_urn = parent.to_urn()?;
                // Validate the enricher segment on its own before gluing it on
                let own_urn = Urn::new(&self.framework, &own)?;
                let nss = format!("{}+{}", parent_urn.nss(), own_urn);
                Ok(Urn::new(parent_urn.nid(), &nss)?.normalize())
            }
        }
    }

    pub fn is_enricher(&self) -> bool {
        self.parent.is_some()
    }

    /// Collector actions followed by ecosystem actions.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.collector_actions
            .iter()
            .chain(self.ecosystem_actions.iter())
            .map(String::as_str)
    }

    /// Result file name, e.g. `falco(install).json`.
    pub fn filename(&self) -> String {
        let actions: Vec<&str> = self.actions().collect();
        let mut name = self.collector.clone();
        if !actions.is_empty() {
            name.push('(');
            name.push_str(&actions.join(","));
            name.push(')');
        }
        if let Some(format) = &self.format {
            name.push('.');
            name.push_str(format);
        }
        name
    }

    /// Render this level's `SS`. Enrichers only render what they declare.
    fn own_nss(&self) -> String {
        let mut out = self.collector.clone();
        for action in &self.collector_actions {
            out.push(',');
            out.push_str(action);
        }

        let format = match &self.parent {
            Some(parent) => self.format.as_ref().filter(|f| parent.format.as_ref() != Some(*f)),
            None => {
                if let Some(ecosystem) = self.ecosystem {
                    out.push('!');
                    out.push_str(ecosystem.as_str());
                    for action in &self.ecosystem_actions {
                        out.push(',');
                        out.push_str(action);
                    }
                }
                self.format.as_ref()
            }
        };

        if let Some(format) = format {
            out.push('.');
            out.push_str(format);
        }
        out
    }
}

fn parse_segment(nss: &str) -> Result<Segment, TypeError> {
    let fail = |reason: &str| TypeError::InvalidComponents {
        input: nss.to_string(),
        reason: reason.to_string(),
    };

    let (body, format) = match nss.split_once('.') {
        Some((body, format)) => {
            if !is_token(format) {
                return Err(fail("invalid format"));
            }
            (body, Some(format.to_string()))
        }
        None => (nss, None),
    };

    let (collector_part, ecosystem_part) = match body.split_once('!') {
        Some((c, e)) => (c, Some(e)),
        None => (body, None),
    };

    let mut collector_tokens = collector_part.split(',');
    let collector = collector_tokens.next().unwrap_or_default();
    if !is_token(collector) {
        return Err(fail("invalid collector"));
    }
    let collector_actions =
        collect_actions(collector_tokens).ok_or_else(|| fail("invalid collector action"))?;

    let (ecosystem, ecosystem_actions) = match ecosystem_part {
        Some(part) => {
            let mut tokens = part.split(',');
            let name = tokens.next().unwrap_or_default();
            if !is_token(name) {
                return Err(fail("invalid ecosystem"));
            }
            let ecosystem = name.parse::<Ecosystem>()?;
            let actions = collect_actions(tokens).ok_or_else(|| fail("invalid ecosystem action"))?;
            (Some(ecosystem), actions)
        }
        None => (None, Vec::new()),
    };

    Ok(Segment {
        collector: collector.to_string(),
        collector_actions,
        ecosystem,
        ecosystem_actions,
        format,
    })
}

fn collect_actions<'a>(tokens: impl Iterator<Item = &'a str>) -> Option<Vec<String>> {
    tokens
        .map(|t| is_token(t).then(|| t.to_string()))
        .collect()
}

fn is_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_grammar() {
        let c = TypeComponents::parse("urn:scan:static,secrets!npm,tarball.json").unwrap();
        assert_eq!(c.framework, "scan");
        assert_eq!(c.collector, "static");
        assert_eq!(c.collector_actions, vec!["secrets"]);
        assert_eq!(c.ecosystem, Some(Ecosystem::Npm));
        assert_eq!(c.ecosystem_actions, vec!["tarball"]);
        assert_eq!(c.format.as_deref(), Some("json"));
        assert!(!c.is_enricher());
    }

    #[test]
    fn test_parse_collector_only() {
        let c = TypeComponents::parse("urn:nop:nop").unwrap();
        assert_eq!(c.collector, "nop");
        assert!(c.ecosystem.is_none());
        assert!(c.format.is_none());
        assert_eq!(c.filename(), "nop");
    }

    #[test]
    fn test_enricher_inherits_ecosystem() {
        let c = TypeComponents::parse("urn:scan:falco!pypi,install.json+urn:enrich:verdicts").unwrap();
        assert!(c.is_enricher());
        assert_eq!(c.framework, "enrich");
        assert_eq!(c.collector, "verdicts");
        assert_eq!(c.ecosystem, Some(Ecosystem::Pypi));
        assert_eq!(c.ecosystem_actions, vec!["install"]);
        assert_eq!(c.format.as_deref(), Some("json"));
        assert_eq!(c.parent.as_ref().unwrap().collector, "falco");
        assert_eq!(c.filename(), "verdicts(install).json");
    }

    #[test]
    fn test_enricher_format_override() {
        let c = TypeComponents::parse("urn:scan:falco!npm,install.json+urn:enrich:verdicts.csv").unwrap();
        assert_eq!(c.format.as_deref(), Some("csv"));
        assert_eq!(
            c.to_urn().unwrap().to_string(),
            "urn:scan:falco!npm,install.json+urn:enrich:verdicts.csv"
        );
    }

    #[test]
    fn test_enricher_rejects_ecosystem() {
        let err = TypeComponents::parse("urn:scan:falco!npm.json+urn:enrich:verdicts!pypi").unwrap_err();
        assert!(matches!(err, TypeError::InvalidComponents { .. }));
    }

    #[test]
    fn test_to_urn_round_trip() {
        for input in [
            "urn:nop:nop",
            "urn:scan:typo!npm.json",
            "urn:scan:static,secrets!npm,tarball.json",
            "urn:scan:falco!npm,install.json+urn:enrich:verdicts",
        ] {
            let c = TypeComponents::parse(input).unwrap();
            assert_eq!(c.to_urn().unwrap().to_string(), input);
        }
    }

    #[test]
    fn test_to_urn_normalizes_framework() {
        let c = TypeComponents::parse("urn:SCAN:typo!npm.json").unwrap();
        assert_eq!(c.to_urn().unwrap().to_string(), "urn:scan:typo!npm.json");
    }

    #[test]
    fn test_filename_orders_actions() {
        let c = TypeComponents::parse("urn:scan:static,secrets!npm,tarball.json").unwrap();
        assert_eq!(c.filename(), "static(secrets,tarball).json");
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeComponents::parse("urn:scan:!npm").is_err());
        assert!(TypeComponents::parse("urn:scan:falco,!npm").is_err());
        assert!(TypeComponents::parse("urn:scan:falco!cargo").is_err());
        assert!(TypeComponents::parse("urn:scan:falco.").is_err());
        assert!(TypeComponents::parse("urn:scan:falco.json.gz").is_err());
    }
}
