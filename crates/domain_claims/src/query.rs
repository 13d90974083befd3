//! Role-scoped claim queries
//!
//! Sorting and filtering are restricted to an explicit allow-list of fields;
//! nothing is resolved from caller-supplied names at query time.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use core_kernel::{HospitalId, UserId};

use crate::claim::{Claim, ClaimStatus};
use crate::error::BusinessRuleViolation;
use crate::treatment::TreatmentRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Which claims and treatment records a caller may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimScope {
    /// Claims officers and admins
    All,
    /// Records owned by the customer
    Customer(UserId),
    /// Records at any of the hospitals a manager runs; never empty
    Hospitals(Vec<HospitalId>),
    /// Records on policies the agent enrolled
    Agent(UserId),
    /// A hospital manager with no hospital on record
    Nothing,
}

impl ClaimScope {
    /// Scope for a manager of `hospitals`
    pub fn hospitals(hospitals: Vec<HospitalId>) -> Self {
        if hospitals.is_empty() {
            ClaimScope::Nothing
        } else {
            ClaimScope::Hospitals(hospitals)
        }
    }

    fn admits_parts(&self, customer: UserId, hospital: Option<HospitalId>, policy_agent: Option<UserId>) -> bool {
        match self {
            ClaimScope::All => true,
            ClaimScope::Customer(user) => customer == *user,
            ClaimScope::Hospitals(hospitals) => hospital.is_some_and(|h| hospitals.contains(&h)),
            ClaimScope::Agent(agent) => policy_agent == Some(*agent),
            ClaimScope::Nothing => false,
        }
    }

    /// `policy_agent` is the enrolling agent of the claim's policy, if any
    pub fn admits(&self, claim: &Claim, policy_agent: Option<UserId>) -> bool {
        self.admits_parts(claim.customer_id, claim.hospital_id, policy_agent)
    }

    pub fn admits_treatment(&self, record: &TreatmentRecord, policy_agent: Option<UserId>) -> bool {
        self.admits_parts(record.customer_id, Some(record.hospital_id), policy_agent)
    }
}

/// Sortable claim fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimSortField {
    #[default]
    Id,
    ClaimNumber,
    ClaimAmount,
    ApprovedAmount,
    Status,
    SubmittedAt,
}

impl ClaimSortField {
    /// Column name in the claims table
    pub fn column(&self) -> &'static str {
        match self {
            ClaimSortField::Id => "id",
            ClaimSortField::ClaimNumber => "claim_number",
            ClaimSortField::ClaimAmount => "claim_amount",
            ClaimSortField::ApprovedAmount => "approved_amount",
            ClaimSortField::Status => "status",
            ClaimSortField::SubmittedAt => "submitted_at",
        }
    }

    fn compare(&self, a: &Claim, b: &Claim) -> Ordering {
        match self {
            ClaimSortField::Id => a.id.cmp(&b.id),
            ClaimSortField::ClaimNumber => a.claim_number.cmp(&b.claim_number),
            ClaimSortField::ClaimAmount => a.claim_amount.cmp(&b.claim_amount),
            ClaimSortField::ApprovedAmount => a.approved_amount.cmp(&b.approved_amount),
            ClaimSortField::Status => a.status.as_str().cmp(b.status.as_str()),
            ClaimSortField::SubmittedAt => a.submitted_at.cmp(&b.submitted_at),
        }
    }
}

impl FromStr for ClaimSortField {
    type Err = BusinessRuleViolation;

    /// Accepts snake_case and camelCase spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "id" | "claimid" => Ok(ClaimSortField::Id),
            "claimnumber" => Ok(ClaimSortField::ClaimNumber),
            "claimamount" | "amount" => Ok(ClaimSortField::ClaimAmount),
            "approvedamount" => Ok(ClaimSortField::ApprovedAmount),
            "status" => Ok(ClaimSortField::Status),
            "submittedat" | "submitteddate" => Ok(ClaimSortField::SubmittedAt),
            _ => Err(BusinessRuleViolation::InvalidQuery(format!(
                "cannot sort by '{}'",
                s
            ))),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Paged listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimListQuery {
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub status: Option<ClaimStatus>,
    /// Case-insensitive match on claim number, description, or diagnosis
    pub search: Option<String>,
    /// `Some(true)`: only Paid/Rejected. `Some(false)`: exclude them.
    pub archived: Option<bool>,
    pub sort_by: ClaimSortField,
    pub direction: SortDirection,
}

impl Default for ClaimListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            status: None,
            search: None,
            archived: None,
            sort_by: ClaimSortField::default(),
            direction: SortDirection::default(),
        }
    }
}

impl ClaimListQuery {
    pub fn validate(&self) -> Result<(), BusinessRuleViolation> {
        if self.page == 0 {
            return Err(BusinessRuleViolation::InvalidQuery("page starts at 1".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(BusinessRuleViolation::InvalidQuery(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Trimmed, lower-cased search term; blank terms are ignored
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Filter predicate for in-memory evaluation
    pub fn matches(&self, claim: &Claim, diagnosis: Option<&str>) -> bool {
        if let Some(status) = self.status {
            if claim.status != status {
                return false;
            }
        }
        if let Some(archived) = self.archived {
            if claim.status.is_archived() != archived {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let hit = |text: Option<&str>| {
                text.map(|t| t.to_lowercase().contains(&term)).unwrap_or(false)
            };
            if !(hit(Some(&claim.claim_number))
                || hit(claim.treatment_description.as_deref())
                || hit(diagnosis))
            {
                return false;
            }
        }
        true
    }

    /// Ordering for in-memory evaluation, ties broken by id
    pub fn compare(&self, a: &Claim, b: &Claim) -> Ordering {
        let ordering = self.sort_by.compare(a, b).then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(u64::from(self.page_size))
        }
    }
}
