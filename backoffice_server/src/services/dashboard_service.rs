//! Admin dashboard summary.

use serde::Serialize;

use super::list;
use crate::models::contact::ContactSubmission;
use crate::models::course::Course;
use crate::models::registration::CourseRegistration;
use crate::models::testimonial::Testimonial;
use crate::store::{DocumentStore, StoreError};

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_registrations: usize,
    pub total_contacts: usize,
    pub active_courses: usize,
    pub pending_testimonials: usize,
    pub recent_registrations: Vec<CourseRegistration>,
    pub pending_testimonials_preview: Vec<Testimonial>,
}

pub async fn summary(store: &dyn DocumentStore) -> Result<DashboardSummary, StoreError> {
    let (registrations, contacts, courses, testimonials) = tokio::try_join!(
        list::<CourseRegistration>(store),
        list::<ContactSubmission>(store),
        list::<Course>(store),
        list::<Testimonial>(store),
    )?;

    let pending: Vec<Testimonial> = testimonials.into_iter().filter(|t| !t.is_approved).collect();

    Ok(DashboardSummary {
        total_registrations: registrations.len(),
        total_contacts: contacts.len(),
        active_courses: courses.iter().filter(|c| c.is_active).count(),
        pending_testimonials: pending.len(),
        recent_registrations: registrations.into_iter().take(RECENT_LIMIT).collect(),
        pending_testimonials_preview: pending.into_iter().take(RECENT_LIMIT).collect(),
    })
}
