//! Read-only admin views over customers and the visit log.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::models::{
    CompletedVisit, Customer, Money, PassType, PhoneNumber, Purchase, PurchaseId, PurchaseStatus,
    Session,
};

/// Filter criteria for the customer list.
///
/// All criteria are optional. An empty filter matches every customer.
///
/// # Example
///
/// ```rust
/// use playpass::models::PassType;
/// use playpass::report::CustomerFilter;
///
/// let filter = CustomerFilter::new()
///     .search("park")
///     .pass_type(PassType::Monthly)
///     .checked_in_only();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Substring of name, email or phone digits (case-insensitive).
    pub search: Option<String>,
    /// Earliest purchase date (inclusive).
    pub purchased_from: Option<NaiveDate>,
    /// Latest purchase date (inclusive).
    pub purchased_to: Option<NaiveDate>,
    /// Pass type the customer must have bought.
    pub pass_type: Option<PassType>,
    /// Only customers with an open session.
    pub checked_in_only: bool,
}

impl CustomerFilter {
    /// Creates an empty filter that matches all customers.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to customers whose name, email or phone contains `query`.
    #[inline]
    #[must_use]
    pub fn search<T: Into<String>>(mut self, query: T) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Restricts to customers with a purchase made within the given date
    /// range (inclusive).
    #[inline]
    #[must_use]
    pub const fn purchased_between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.purchased_from = Some(from);
        self.purchased_to = Some(to);
        self
    }

    /// Restricts to customers who bought the given pass type.
    #[inline]
    #[must_use]
    pub const fn pass_type(mut self, pass_type: PassType) -> Self {
        self.pass_type = Some(pass_type);
        self
    }

    /// Restricts to customers currently on the play floor.
    #[inline]
    #[must_use]
    pub const fn checked_in_only(mut self) -> Self {
        self.checked_in_only = true;
        self
    }

    /// Returns `true` if the customer satisfies all set criteria.
    ///
    /// Purchase date and pass type must be satisfied by the same purchase.
    #[inline]
    #[must_use]
    pub fn matches(&self, customer: &Customer) -> bool {
        self.matches_search(customer)
            && self.matches_purchases(customer)
            && (!self.checked_in_only || !customer.active_sessions.is_empty())
    }

    /// Returns the matching customers, in input order.
    #[inline]
    #[must_use]
    pub fn apply<'list>(&self, customers: &'list [Customer]) -> Vec<&'list Customer> {
        customers.iter().filter(|c| self.matches(c)).collect()
    }

    /// Checks the free-text search.
    fn matches_search(&self, customer: &Customer) -> bool {
        self.search.as_ref().is_none_or(|query| {
            let needle = query.trim().to_lowercase();
            let digits: String = needle.chars().filter(char::is_ascii_digit).collect();
            customer.name.to_lowercase().contains(&needle)
                || customer.email.to_lowercase().contains(&needle)
                || (!digits.is_empty() && customer.phone.digits().contains(&digits))
        })
    }

    /// Checks purchase date and pass type criteria.
    fn matches_purchases(&self, customer: &Customer) -> bool {
        if self.purchased_from.is_none() && self.purchased_to.is_none() && self.pass_type.is_none()
        {
            return true;
        }
        customer.purchases.iter().any(|p| self.matches_purchase(p))
    }

    /// Checks one purchase against date and type criteria.
    fn matches_purchase(&self, purchase: &Purchase) -> bool {
        let day = purchase.purchase_date.date_naive();
        self.purchased_from.is_none_or(|from| day >= from)
            && self.purchased_to.is_none_or(|to| day <= to)
            && self.pass_type.is_none_or(|kind| purchase.pass_type == kind)
    }
}

/// Sales for one pass type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSales {
    /// Pass type.
    pub pass_type: PassType,
    /// Number sold.
    pub count: usize,
    /// Revenue from this type.
    pub revenue: Money,
}

/// A visitor currently on the play floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentVisitor {
    /// Customer name.
    pub name: String,
    /// Customer phone.
    pub phone: PhoneNumber,
    /// The open session.
    pub session: Session,
}

/// A scheduled party that has not started yet, or is inside its window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingParty {
    /// Customer who booked the party.
    pub host: String,
    /// Customer phone.
    pub phone: PhoneNumber,
    /// Party purchase.
    pub purchase_id: PurchaseId,
    /// Package name.
    pub package: String,
    /// Scheduled start.
    pub start: DateTime<Utc>,
    /// Expected guests.
    pub guests: u32,
    /// Birthday child, if given.
    pub child_name: Option<String>,
}

/// Dashboard figures for the front desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    /// Day the daily figures refer to.
    pub day: NaiveDate,
    /// Registered customers.
    pub customers: usize,
    /// Visitors on the floor now, by check-in time.
    pub checked_in: Vec<PresentVisitor>,
    /// Admission passes currently active.
    pub active_passes: usize,
    /// Passes that expired.
    pub expired_passes: usize,
    /// Passes used up (including food).
    pub used_passes: usize,
    /// All-time revenue.
    pub total_revenue: Money,
    /// Revenue from purchases made on `day`.
    pub revenue_on_day: Money,
    /// Sales per pass type, in catalog order.
    pub by_type: Vec<TypeSales>,
    /// Visits that started on `day`, from the visit log.
    pub visits_on_day: usize,
    /// Mean length of all logged visits.
    pub average_visit: Option<TimeDelta>,
    /// Unredeemed parties whose check-in window has not closed, soonest
    /// first.
    pub upcoming_parties: Vec<UpcomingParty>,
}

impl DashboardStats {
    /// Aggregates the dashboard at `now`.
    ///
    /// Daily figures use the UTC calendar day of `now`. `party_window` is
    /// how long after its start a party still counts as upcoming.
    #[inline]
    #[must_use]
    pub fn compute(
        customers: &[Customer],
        visits: &[CompletedVisit],
        now: DateTime<Utc>,
        party_window: TimeDelta,
    ) -> Self {
        let day = now.date_naive();
        let purchases = || customers.iter().flat_map(|c| c.purchases.iter());
        let count_status = |status: PurchaseStatus| {
            purchases()
                .filter(|p| p.pass_type.is_admission() && p.status == status)
                .count()
        };

        let mut checked_in: Vec<PresentVisitor> = customers
            .iter()
            .flat_map(|c| {
                c.active_sessions.iter().map(|session| PresentVisitor {
                    name: c.name.clone(),
                    phone: c.phone.clone(),
                    session: session.clone(),
                })
            })
            .collect();
        checked_in.sort_by_key(|v| v.session.start_time);

        let by_type = PassType::ALL
            .iter()
            .map(|&pass_type| {
                let sold: Vec<&Purchase> =
                    purchases().filter(|p| p.pass_type == pass_type).collect();
                TypeSales {
                    pass_type,
                    count: sold.len(),
                    revenue: sold.iter().map(|p| p.price).sum(),
                }
            })
            .collect();

        let mut upcoming_parties: Vec<UpcomingParty> = customers
            .iter()
            .flat_map(|c| {
                c.purchases.iter().filter_map(|p| {
                    let details = p.party_details()?;
                    let pending = p.is_active() && p.is_unused();
                    let open = details
                        .start
                        .checked_add_signed(party_window)
                        .is_none_or(|closes| closes >= now);
                    (pending && open).then(|| UpcomingParty {
                        host: c.name.clone(),
                        phone: c.phone.clone(),
                        purchase_id: p.id.clone(),
                        package: p.name.clone(),
                        start: details.start,
                        guests: details.guests,
                        child_name: details.child_name.clone(),
                    })
                })
            })
            .collect();
        upcoming_parties.sort_by_key(|party| party.start);

        Self {
            day,
            customers: customers.len(),
            checked_in,
            active_passes: count_status(PurchaseStatus::Active),
            expired_passes: count_status(PurchaseStatus::Expired),
            used_passes: purchases()
                .filter(|p| p.status == PurchaseStatus::Used)
                .count(),
            total_revenue: purchases().map(|p| p.price).sum(),
            revenue_on_day: purchases()
                .filter(|p| p.purchase_date.date_naive() == day)
                .map(|p| p.price)
                .sum(),
            by_type,
            visits_on_day: visits
                .iter()
                .filter(|v| v.start_time.date_naive() == day)
                .count(),
            average_visit: average_duration(visits),
            upcoming_parties,
        }
    }
}

/// Mean visit length, or `None` for an empty log.
fn average_duration(visits: &[CompletedVisit]) -> Option<TimeDelta> {
    let count = i32::try_from(visits.len()).ok().filter(|&n| n > 0)?;
    let total = visits
        .iter()
        .map(CompletedVisit::duration)
        .fold(TimeDelta::zero(), |acc, d| acc + d);
    total.checked_div(count)
}
