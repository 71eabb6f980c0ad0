//! ASCII rating histogram for terminal output.
//!
//! This is intentionally "dumb" (one row per star, fixed-width bars), optimized for:
//! - quick visual checks in a terminal
//! - deterministic output (helpful for golden tests)

use crate::domain::RatingDistribution;

/// Render a horizontal bar chart, 5 stars on top.
///
/// `width` is the bar width for the most common rating; other bars scale to it.
pub fn render_rating_histogram(dist: &RatingDistribution, width: usize) -> String {
    let width = width.max(1);
    let max = dist.counts().iter().map(|&(_, n)| n).max().unwrap_or(0);
    let count_width = max.to_string().len();

    let mut out = String::new();
    out.push_str(&format!("Rating distribution (n={})\n", dist.total()));

    for (stars, count) in dist.counts().into_iter().rev() {
        let bar = bar_len(count, max, width);
        out.push_str(&format!(
            "{stars}* | {}{} {count:>count_width$}\n",
            "#".repeat(bar),
            " ".repeat(width - bar),
        ));
    }

    out
}

fn bar_len(count: usize, max: usize, width: usize) -> usize {
    if max == 0 || count == 0 {
        return 0;
    }
    // Any non-zero count gets at least one cell.
    ((count as f64 / max as f64) * width as f64).round().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_golden_snapshot_small() {
        let dist = RatingDistribution::from_ratings(&[5, 5, 5, 5, 4, 1, 1, 2]);
        let txt = render_rating_histogram(&dist, 8);
        let expected = concat!(
            "Rating distribution (n=8)\n",
            "5* | ######## 4\n",
            "4* | ##       1\n",
            "3* |          0\n",
            "2* | ##       1\n",
            "1* | ####     2\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn small_counts_still_show_a_bar() {
        let mut ratings = vec![5; 100];
        ratings.push(1);
        let dist = RatingDistribution::from_ratings(&ratings);
        let txt = render_rating_histogram(&dist, 10);
        // 9 cells of padding, the separator, then the count right-aligned to 3.
        assert!(txt.contains(&format!("1* | #{}  1\n", " ".repeat(10))));
    }

    #[test]
    fn empty_distribution_renders_zero_rows() {
        let txt = render_rating_histogram(&RatingDistribution::default(), 4);
        assert!(txt.starts_with("Rating distribution (n=0)\n"));
        assert!(txt.contains("3* |      0\n"));
    }
}
