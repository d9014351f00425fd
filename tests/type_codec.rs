//! Registered types: URN round-trips, table completeness and enricher rules.

use std::collections::HashSet;

use pkgsec::analysis::types;
use pkgsec::analysis::{Type, TypeComponents, Urn};
use pkgsec::error::TypeError;
use pkgsec::Ecosystem;

#[test]
fn table_initializes() {
    types::init().unwrap();
}

#[test]
fn every_type_round_trips_through_its_urn() {
    for kind in Type::ALL {
        let urn = kind.to_urn().unwrap().to_string();
        assert_eq!(Type::from_urn(&urn).unwrap(), kind, "{}", urn);
        assert_eq!(urn.parse::<Type>().unwrap(), kind);
    }
}

#[test]
fn urns_are_distinct() {
    let urns: HashSet<String> = Type::ALL
        .iter()
        .map(|t| t.to_urn().unwrap().to_string())
        .collect();
    assert_eq!(urns.len(), Type::ALL.len());
}

#[test]
fn enrichers_inherit_parent_ecosystem() {
    for kind in Type::ALL {
        let components = kind.components().unwrap();
        if let Some(parent) = &components.parent {
            assert_eq!(components.ecosystem, parent.ecosystem, "{}", kind.name());
            assert!(kind.is_enricher().unwrap());
        }
    }
    assert_eq!(
        Type::NpmFalcoInstallVerdicts.ecosystem().unwrap(),
        Some(Ecosystem::Npm)
    );
    assert_eq!(
        Type::PypiFalcoInstallVerdicts.ecosystem().unwrap(),
        Some(Ecosystem::Pypi)
    );
}

#[test]
fn lookup_ignores_nid_case_only() {
    assert_eq!(
        Type::from_urn("URN:SCAN:falco!npm,install.json").unwrap(),
        Type::NpmFalcoInstall
    );
    assert!(matches!(
        Type::from_urn("urn:scan:FALCO!npm,install.json"),
        Err(TypeError::NotFound(_))
    ));
    assert!(matches!(Type::from_urn("something"), Err(TypeError::InvalidUrn { .. })));
}

#[test]
fn unregistered_but_valid_components_decode() {
    let components = TypeComponents::parse("urn:scan:falco,network!npm,install.json").unwrap();
    assert_eq!(components.filename(), "falco(network,install).json");
    assert!(Type::from_urn("urn:scan:falco,network!npm,install.json").is_err());
}

#[test]
fn ecosystem_listing() {
    let npm = Type::of_ecosystem(Some(Ecosystem::Npm)).unwrap();
    assert_eq!(npm.len(), 5);
    assert!(npm.iter().all(|t| t.ecosystem().unwrap() == Some(Ecosystem::Npm)));
    assert_eq!(Type::of_ecosystem(None).unwrap(), vec![Type::Nop]);
}

#[test]
fn urn_equivalence() {
    let a: Urn = "urn:Scan:static%2cx".parse().unwrap();
    let b: Urn = "URN:scan:static%2Cx".parse().unwrap();
    assert!(a.matches(&b));
    assert_eq!(a.normalize().to_string(), "urn:scan:static%2Cx");
}

#[test]
fn sealed_tokens_open_to_the_same_type() {
    for kind in Type::ALL {
        let token = kind.seal(&["org-1"]).unwrap();
        let (opened, extra) = Type::open(&token).unwrap();
        assert_eq!(opened, kind);
        assert_eq!(extra, vec!["org-1".to_string()]);
    }
}
