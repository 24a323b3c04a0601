//! Amazon marketplaces and their Product Advertising API endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported marketplaces with their storefront domain, API host, and signing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    #[default]
    Us,
    Uk,
    De,
    Fr,
    Es,
    It,
    Nl,
    Se,
    Pl,
    Ca,
    Au,
    Jp,
    In,
    Br,
    Mx,
}

impl Marketplace {
    /// Returns the storefront domain, as sent in the `Marketplace` request field.
    pub fn domain(&self) -> &'static str {
        match self {
            Marketplace::Us => "www.amazon.com",
            Marketplace::Uk => "www.amazon.co.uk",
            Marketplace::De => "www.amazon.de",
            Marketplace::Fr => "www.amazon.fr",
            Marketplace::Es => "www.amazon.es",
            Marketplace::It => "www.amazon.it",
            Marketplace::Nl => "www.amazon.nl",
            Marketplace::Se => "www.amazon.se",
            Marketplace::Pl => "www.amazon.pl",
            Marketplace::Ca => "www.amazon.ca",
            Marketplace::Au => "www.amazon.com.au",
            Marketplace::Jp => "www.amazon.co.jp",
            Marketplace::In => "www.amazon.in",
            Marketplace::Br => "www.amazon.com.br",
            Marketplace::Mx => "www.amazon.com.mx",
        }
    }

    /// Returns the PA-API host for this marketplace.
    pub fn api_host(&self) -> String {
        // Every locale follows the storefront domain with `webservices` in place of `www`.
        self.domain().replacen("www.", "webservices.", 1)
    }

    /// Returns the AWS region used in the credential scope.
    pub fn aws_region(&self) -> &'static str {
        match self {
            Marketplace::Us | Marketplace::Ca | Marketplace::Br | Marketplace::Mx => "us-east-1",
            Marketplace::Au | Marketplace::Jp => "us-west-2",
            Marketplace::Uk
            | Marketplace::De
            | Marketplace::Fr
            | Marketplace::Es
            | Marketplace::It
            | Marketplace::Nl
            | Marketplace::Se
            | Marketplace::Pl
            | Marketplace::In => "eu-west-1",
        }
    }

    /// Returns the storefront base URL.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain())
    }

    /// Returns the currency code for this marketplace.
    pub fn currency(&self) -> &'static str {
        match self {
            Marketplace::Us => "USD",
            Marketplace::Uk => "GBP",
            Marketplace::De
            | Marketplace::Fr
            | Marketplace::Es
            | Marketplace::It
            | Marketplace::Nl => "EUR",
            Marketplace::Se => "SEK",
            Marketplace::Pl => "PLN",
            Marketplace::Ca => "CAD",
            Marketplace::Au => "AUD",
            Marketplace::Jp => "JPY",
            Marketplace::In => "INR",
            Marketplace::Br => "BRL",
            Marketplace::Mx => "MXN",
        }
    }

    /// Returns all supported marketplaces.
    pub fn all() -> &'static [Marketplace] {
        &[
            Marketplace::Us,
            Marketplace::Uk,
            Marketplace::De,
            Marketplace::Fr,
            Marketplace::Es,
            Marketplace::It,
            Marketplace::Nl,
            Marketplace::Se,
            Marketplace::Pl,
            Marketplace::Ca,
            Marketplace::Au,
            Marketplace::Jp,
            Marketplace::In,
            Marketplace::Br,
            Marketplace::Mx,
        ]
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Marketplace::Us => "us",
            Marketplace::Uk => "uk",
            Marketplace::De => "de",
            Marketplace::Fr => "fr",
            Marketplace::Es => "es",
            Marketplace::It => "it",
            Marketplace::Nl => "nl",
            Marketplace::Se => "se",
            Marketplace::Pl => "pl",
            Marketplace::Ca => "ca",
            Marketplace::Au => "au",
            Marketplace::Jp => "jp",
            Marketplace::In => "in",
            Marketplace::Br => "br",
            Marketplace::Mx => "mx",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Marketplace {
    type Err = MarketplaceParseError;

    /// Accepts a short code, a country name, or a storefront domain.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if let Some(found) = Marketplace::all().iter().find(|m| {
            m.domain() == normalized || m.domain().trim_start_matches("www.") == normalized
        }) {
            return Ok(*found);
        }

        match normalized.as_str() {
            "us" | "usa" | "united states" => Ok(Marketplace::Us),
            "uk" | "gb" | "united kingdom" => Ok(Marketplace::Uk),
            "de" | "germany" => Ok(Marketplace::De),
            "fr" | "france" => Ok(Marketplace::Fr),
            "es" | "spain" => Ok(Marketplace::Es),
            "it" | "italy" => Ok(Marketplace::It),
            "nl" | "netherlands" => Ok(Marketplace::Nl),
            "se" | "sweden" => Ok(Marketplace::Se),
            "pl" | "poland" => Ok(Marketplace::Pl),
            "ca" | "canada" => Ok(Marketplace::Ca),
            "au" | "australia" => Ok(Marketplace::Au),
            "jp" | "japan" => Ok(Marketplace::Jp),
            "in" | "india" => Ok(Marketplace::In),
            "br" | "brazil" => Ok(Marketplace::Br),
            "mx" | "mexico" => Ok(Marketplace::Mx),
            _ => Err(MarketplaceParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketplaceParseError(String);

impl fmt::Display for MarketplaceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown marketplace '{}'. Valid marketplaces: us, uk, de, fr, es, it, nl, se, pl, ca, au, jp, in, br, mx",
            self.0
        )
    }
}

impl std::error::Error for MarketplaceParseError {}
