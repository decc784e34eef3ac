// src/parser/mod.rs

//! Listing page parsing.
//!
//! Extracts structured [`JobPosting`] records from raw page HTML using the
//! configured CSS selectors. Parsing degrades gracefully: a tile missing
//! optional fields becomes a partial record flagged `low_confidence`; a
//! tile missing its title or link is unusable and skipped; a page with no
//! recognizable tiles yields zero records.

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::fetcher::RawPage;
use crate::models::{
    BudgetRange, ClientSignals, ExperienceTier, JobPosting, JobStatus, JobType, ListingSelectors,
};
use crate::utils::{content_hash, normalize_whitespace};

/// Compiled selector set plus the extraction regexes.
pub struct ListingParser {
    tile: Selector,
    title: Selector,
    link: Selector,
    description: Selector,
    budget: Selector,
    experience: Selector,
    job_type: Selector,
    duration: Selector,
    client_spent: Selector,
    client_rating: Selector,
    client_hire_rate: Selector,
    money_re: Regex,
    job_token_re: Regex,
    percent_re: Regex,
}

impl ListingParser {
    /// Compile the configured selectors.
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            tile: Self::parse_selector(&selectors.tile)?,
            title: Self::parse_selector(&selectors.title)?,
            link: Self::parse_selector(&selectors.link)?,
            description: Self::parse_selector(&selectors.description)?,
            budget: Self::parse_selector(&selectors.budget)?,
            experience: Self::parse_selector(&selectors.experience)?,
            job_type: Self::parse_selector(&selectors.job_type)?,
            duration: Self::parse_selector(&selectors.duration)?,
            client_spent: Self::parse_selector(&selectors.client_spent)?,
            client_rating: Self::parse_selector(&selectors.client_rating)?,
            client_hire_rate: Self::parse_selector(&selectors.client_hire_rate)?,
            // $15.00-$25.00, $15-$25, $500, $1,000, $20K+
            money_re: Regex::new(
                r"\$\s*(\d+(?:,\d{3})*(?:\.\d+)?)\s*([kKmM])?(?:\s*-\s*\$\s*(\d+(?:,\d{3})*(?:\.\d+)?)\s*([kKmM])?)?",
            )
            .map_err(|e| AppError::parse("money regex", e))?,
            job_token_re: Regex::new(r"~([0-9a-zA-Z]+)")
                .map_err(|e| AppError::parse("job token regex", e))?,
            percent_re: Regex::new(r"(\d+(?:\.\d+)?)\s*%")
                .map_err(|e| AppError::parse("percent regex", e))?,
        })
    }

    /// Extract all job postings from a raw page.
    pub fn parse(&self, page: &RawPage) -> Vec<JobPosting> {
        let document = Html::parse_document(&page.body);
        let base = url::Url::parse(&page.url).ok();

        let mut postings = Vec::new();
        for tile in document.select(&self.tile) {
            match self.parse_tile(&tile, base.as_ref()) {
                Some(posting) => postings.push(posting),
                None => log::debug!("skipped unusable tile on page {}", page.page),
            }
        }
        postings
    }

    /// Parse one tile. Returns None only when the tile has no usable
    /// title or link.
    fn parse_tile(&self, tile: &ElementRef<'_>, base: Option<&url::Url>) -> Option<JobPosting> {
        let title = self.select_text(tile, &self.title)?;
        let link = self.resolve_link(tile, base)?;

        let description = self.select_text(tile, &self.description);
        let job_type = self
            .select_text(tile, &self.job_type)
            .and_then(|t| JobType::parse(&t));
        let budget = self
            .select_text(tile, &self.budget)
            .and_then(|t| self.parse_budget(&t, job_type));
        let experience_level = self
            .select_text(tile, &self.experience)
            .and_then(|t| ExperienceTier::parse(&t));
        let duration = self.select_text(tile, &self.duration);

        let client = ClientSignals {
            total_spent: self
                .select_text(tile, &self.client_spent)
                .and_then(|t| self.parse_money(&t).map(|(min, _)| min)),
            rating: self
                .select_text(tile, &self.client_rating)
                .and_then(|t| parse_leading_number(&t))
                .filter(|r| (0.0..=5.0).contains(r)),
            hire_rate: self
                .select_text(tile, &self.client_hire_rate)
                .and_then(|t| self.parse_percent(&t)),
        };

        // Partial records survive with lowered confidence instead of being
        // discarded; only title/link are indispensable.
        let low_confidence =
            description.is_none() || budget.is_none() || experience_level.is_none();

        let raw_tile = tile.html();
        let description = description.unwrap_or_default();
        let id = self.extract_job_id(&link, &title, &description);

        Some(JobPosting {
            id,
            title,
            description,
            link,
            budget,
            experience_level,
            job_type,
            duration,
            client,
            scraped_at: Utc::now(),
            content_hash: content_hash(&raw_tile),
            low_confidence,
            status: JobStatus::New,
        })
    }

    /// Stable external id: the listing URL's job token when present,
    /// otherwise a hash prefix of title + description.
    fn extract_job_id(&self, link: &str, title: &str, description: &str) -> String {
        if let Some(captures) = self.job_token_re.captures(link) {
            return format!("job_{}", &captures[1]);
        }
        // Last non-empty path segment, if it looks like an id
        if let Ok(parsed) = url::Url::parse(link) {
            if let Some(segment) = parsed
                .path_segments()
                .and_then(|s| s.filter(|p| !p.is_empty()).last())
            {
                if segment.len() >= 8 && segment.chars().any(|c| c.is_ascii_digit()) {
                    return format!("job_{segment}");
                }
            }
        }
        let digest = content_hash(&format!("{title}\n{description}"));
        format!("job_{}", &digest[..16])
    }

    /// Budget text to an hourly-equivalent range.
    fn parse_budget(&self, text: &str, job_type: Option<JobType>) -> Option<BudgetRange> {
        let (min, max) = self.parse_money(text)?;
        match job_type {
            Some(JobType::Fixed) => {
                // Fixed budgets are normalized by an estimated effort so they
                // compare against hourly profile rates.
                let hours = estimate_project_hours(max);
                Some(BudgetRange {
                    min: min / hours,
                    max: max / hours,
                })
            }
            _ => Some(BudgetRange { min, max }),
        }
    }

    /// Parse `$a`, `$a-$b`, with optional thousands separators and K/M
    /// suffixes. A single value yields min == max.
    fn parse_money(&self, text: &str) -> Option<(f64, f64)> {
        let captures = self.money_re.captures(text)?;
        let min = parse_amount(&captures[1], captures.get(2).map(|m| m.as_str()))?;
        let max = match captures.get(3) {
            Some(m) => parse_amount(m.as_str(), captures.get(4).map(|m| m.as_str()))?,
            None => min,
        };
        if min > max {
            return Some((max, min));
        }
        Some((min, max))
    }

    fn parse_percent(&self, text: &str) -> Option<f64> {
        let captures = self.percent_re.captures(text)?;
        let value: f64 = captures[1].parse().ok()?;
        Some((value / 100.0).clamp(0.0, 1.0))
    }

    fn select_text(&self, tile: &ElementRef<'_>, selector: &Selector) -> Option<String> {
        let element = tile.select(selector).next()?;
        let text = normalize_whitespace(&element.text().collect::<String>());
        if text.is_empty() { None } else { Some(text) }
    }

    fn resolve_link(&self, tile: &ElementRef<'_>, base: Option<&url::Url>) -> Option<String> {
        let element = tile.select(&self.link).next()?;
        let href = element.value().attr("href")?;
        if href.is_empty() {
            return None;
        }
        match base {
            Some(base) => base.join(href).map(|u| u.to_string()).ok(),
            None => Some(href.to_string()),
        }
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Leading float in a text, e.g. a "4.85" rating.
fn parse_leading_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

/// Dollar amount with optional comma separators and K/M suffix.
fn parse_amount(digits: &str, suffix: Option<&str>) -> Option<f64> {
    let value: f64 = digits.replace(',', "").parse().ok()?;
    let multiplier = match suffix {
        Some("k") | Some("K") => 1_000.0,
        Some("m") | Some("M") => 1_000_000.0,
        _ => 1.0,
    };
    Some(value * multiplier)
}

/// Rough effort estimate for a fixed-price budget, in hours.
fn estimate_project_hours(fixed_price: f64) -> f64 {
    if fixed_price < 500.0 {
        20.0
    } else if fixed_price < 2_000.0 {
        40.0
    } else if fixed_price < 5_000.0 {
        60.0
    } else {
        80.0
    }
}
