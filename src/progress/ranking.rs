use super::{ProfileSnapshot, RankingEntry};

/// Orders profiles by total points, highest first. Equal totals keep their
/// input order.
pub fn generate_ranking(profiles: &[ProfileSnapshot]) -> Vec<RankingEntry> {
    let mut ordered: Vec<&ProfileSnapshot> = profiles.iter().collect();
    ordered.sort_by(|a, b| b.progress.total_points.cmp(&a.progress.total_points));

    ordered
        .into_iter()
        .map(|profile| RankingEntry {
            display_name: profile.display_name.clone(),
            total_points: profile.progress.total_points,
        })
        .collect()
}
