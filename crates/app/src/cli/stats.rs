use driveshare_app::domain::reports::ReportsService;

use crate::cli::{
    Session, failed,
    output::{fields, money},
};

pub(crate) async fn run(session: &Session) -> Result<(), String> {
    let stats = session
        .app
        .reports
        .platform_stats(session.actor)
        .await
        .map_err(failed("compute platform stats"))?;

    fields([
        ("total_revenue", money(stats.total_revenue)),
        ("platform_fees", money(stats.platform_fees)),
        ("bookings", stats.bookings.to_string()),
        ("active_renters", stats.active_renters.to_string()),
        ("pending_approvals", stats.pending_approvals.to_string()),
    ]);

    Ok(())
}
