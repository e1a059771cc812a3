//! URL handling module for Spidey
//!
//! This module provides relative-reference resolution, registrable-domain
//! extraction, wildcard matching and the domain scoping policy.

mod domain;
mod matcher;
mod resolve;

use std::collections::HashSet;
use url::Url;

// Re-export main functions
pub use domain::{extract_host, registrable_domain};
pub use matcher::{matches_exclusion, matches_wildcard};
pub use resolve::{normalize, resolve, resolve_all};

/// Outcome of checking a URL against the crawl scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeDecision {
    /// URL may be crawled
    InScope,
    /// URL's domain is on the exclusion list
    Excluded,
    /// Crawl is restricted to seed domains and this is not one of them
    OutsideSeeds,
    /// URL has no host to classify
    NoDomain,
}

impl ScopeDecision {
    /// Returns true if the URL should be crawled
    pub fn is_in_scope(&self) -> bool {
        matches!(self, Self::InScope)
    }
}

/// Domain scoping policy, fixed at crawl start
///
/// Exclusions take priority over the seed restriction.
#[derive(Debug, Clone, Default)]
pub struct DomainPolicy {
    seed_domains: HashSet<String>,
    excluded: Vec<String>,
    restrict_to_seeds: bool,
}

impl DomainPolicy {
    /// Builds the policy, computing seed domains from every seed URL
    ///
    /// Seeds without a host contribute no domain.
    ///
    /// # Examples
    ///
    /// ```
    /// use spidey::url::DomainPolicy;
    ///
    /// let seeds = vec!["https://a.test/".to_string()];
    /// let policy = DomainPolicy::from_seeds(&seeds, &[], true);
    /// assert!(policy.in_scope("https://www.a.test/page"));
    /// assert!(!policy.in_scope("https://b.test/"));
    /// ```
    pub fn from_seeds(seeds: &[String], excluded: &[String], restrict_to_seeds: bool) -> Self {
        let seed_domains = seeds
            .iter()
            .filter_map(|seed| registrable_domain(seed))
            .collect();

        Self {
            seed_domains,
            excluded: excluded.iter().map(|e| e.to_lowercase()).collect(),
            restrict_to_seeds,
        }
    }

    /// The registrable domains of the seed URLs
    pub fn seed_domains(&self) -> &HashSet<String> {
        &self.seed_domains
    }

    /// Classifies a URL against the policy
    pub fn classify(&self, url: &str) -> ScopeDecision {
        let host = match Url::parse(url).ok().as_ref().and_then(extract_host) {
            Some(host) => host,
            None => return ScopeDecision::NoDomain,
        };
        let domain = match registrable_domain(url) {
            Some(domain) => domain,
            None => return ScopeDecision::NoDomain,
        };

        if self
            .excluded
            .iter()
            .any(|pattern| matches_exclusion(pattern, &host, &domain))
        {
            return ScopeDecision::Excluded;
        }

        if self.restrict_to_seeds && !self.seed_domains.contains(&domain) {
            return ScopeDecision::OutsideSeeds;
        }

        ScopeDecision::InScope
    }

    /// Returns true if the URL may be crawled
    pub fn in_scope(&self, url: &str) -> bool {
        self.classify(url).is_in_scope()
    }
}

/// Decides whether a URL is in scope
///
/// Convenience form of [`DomainPolicy::classify`] for callers holding the
/// raw domain sets.
pub fn in_scope(
    url: &str,
    seed_domains: &HashSet<String>,
    excluded_domains: &[String],
    restrict_to_seeds: bool,
) -> bool {
    let policy = DomainPolicy {
        seed_domains: seed_domains.clone(),
        excluded: excluded_domains.iter().map(|e| e.to_lowercase()).collect(),
        restrict_to_seeds,
    };
    policy.in_scope(url)
}
