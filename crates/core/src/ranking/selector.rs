// Hearth is an open source community crowdfunding platform.
// Copyright (C) 2024 Hearth
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use hashbrown::HashSet;

/// Size partition used when cutting a candidate list down to a diverse set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub fn of(member_count: u64) -> Self {
        if member_count < 20 {
            SizeBucket::Small
        } else if member_count < 100 {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        }
    }
}

/// What [`ensure_diversity`] needs to know about a candidate.
pub trait Diverse {
    fn member_count(&self) -> u64;

    /// An empty slice means untagged; untagged candidates always pass the
    /// tag-overlap filter.
    fn tags(&self) -> &[String];
}

/// Cut `candidates` down to at most `max_count`, keeping a mix of community
/// sizes and tags. Identity when the input already fits: no reordering, no
/// dropping.
///
/// The output is bucket-major (medium, small, large), not score-major, and a
/// bucket's quota is never backfilled from another bucket; callers wanting
/// score order must sort before calling and accept the trade of rank for
/// representation. Two more load-bearing details: the used-tag set grows for
/// every candidate a bucket prefix evaluates, kept or not, and the
/// half-of-max overlap allowance compares against the output length as it was
/// before the current bucket.
pub fn ensure_diversity<T: Diverse>(candidates: Vec<T>, max_count: usize) -> Vec<T> {
    if candidates.len() <= max_count {
        return candidates;
    }

    let mut small = Vec::new();
    let mut medium = Vec::new();
    let mut large = Vec::new();

    for candidate in candidates {
        match SizeBucket::of(candidate.member_count()) {
            SizeBucket::Small => small.push(candidate),
            SizeBucket::Medium => medium.push(candidate),
            SizeBucket::Large => large.push(candidate),
        }
    }

    let medium_quota = (max_count as f64 * 0.5).floor() as usize;
    let side_quota = (max_count as f64 * 0.25).floor() as usize;

    let mut used_tags = HashSet::new();
    let mut diverse: Vec<T> = Vec::new();

    for (bucket, quota) in [(medium, medium_quota), (small, side_quota), (large, side_quota)] {
        let accepted_before = diverse.len();
        diverse.extend(pick_from_bucket(
            bucket,
            quota,
            accepted_before,
            max_count,
            &mut used_tags,
        ));
    }

    diverse.truncate(max_count);
    diverse
}

fn pick_from_bucket<T: Diverse>(
    bucket: Vec<T>,
    quota: usize,
    accepted_before: usize,
    max_count: usize,
    used_tags: &mut HashSet<String>,
) -> Vec<T> {
    bucket
        .into_iter()
        .take(quota)
        .filter(|candidate| {
            let tags = candidate.tags();
            if tags.is_empty() {
                return true;
            }

            let has_new_tag = tags.iter().any(|tag| !used_tags.contains(tag));
            for tag in tags {
                used_tags.insert(tag.clone());
            }

            has_new_tag || (accepted_before as f64) < max_count as f64 / 2.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Candidate {
        name: &'static str,
        member_count: u64,
        tags: Vec<String>,
    }

    impl Diverse for Candidate {
        fn member_count(&self) -> u64 {
            self.member_count
        }

        fn tags(&self) -> &[String] {
            &self.tags
        }
    }

    fn candidate(name: &'static str, member_count: u64, tags: &[&str]) -> Candidate {
        Candidate {
            name,
            member_count,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn names(candidates: &[Candidate]) -> Vec<&'static str> {
        candidates.iter().map(|c| c.name).collect()
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(SizeBucket::of(0), SizeBucket::Small);
        assert_eq!(SizeBucket::of(19), SizeBucket::Small);
        assert_eq!(SizeBucket::of(20), SizeBucket::Medium);
        assert_eq!(SizeBucket::of(99), SizeBucket::Medium);
        assert_eq!(SizeBucket::of(100), SizeBucket::Large);
    }

    #[test]
    fn identity_when_input_fits() {
        let candidates = vec![
            candidate("a", 500, &["x"]),
            candidate("b", 5, &["x"]),
            candidate("c", 50, &["x"]),
        ];

        let selected = ensure_diversity(candidates.clone(), 10);

        // no reordering and no dropping, overlapping tags included
        assert_eq!(selected, candidates);
    }

    #[test]
    fn never_exceeds_max_count() {
        let candidates: Vec<_> = (0..40)
            .map(|i| match i % 3 {
                0 => candidate("small", 5, &[]),
                1 => candidate("medium", 50, &[]),
                _ => candidate("large", 500, &[]),
            })
            .collect();

        assert!(ensure_diversity(candidates, 10).len() <= 10);
    }

    #[test]
    fn bucket_quota_is_not_backfilled() {
        // 30 medium candidates without tags, max 10: only the medium quota of
        // floor(10 * 0.5) = 5 comes back, not 10
        let candidates: Vec<_> = (0..30).map(|_| candidate("m", 50, &[])).collect();

        let selected = ensure_diversity(candidates, 10);

        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn output_is_bucket_major() {
        let mut candidates = Vec::new();
        for i in 0..4 {
            candidates.push(candidate(["s0", "s1", "s2", "s3"][i], 5, &[]));
            candidates.push(candidate(["m0", "m1", "m2", "m3"][i], 50, &[]));
            candidates.push(candidate(["l0", "l1", "l2", "l3"][i], 500, &[]));
        }

        let selected = ensure_diversity(candidates, 8);

        // medium quota 4, small and large quota 2 each, in that order
        assert_eq!(
            names(&selected),
            vec!["m0", "m1", "m2", "m3", "s0", "s1", "l0", "l1"]
        );
    }

    #[test]
    fn untagged_candidates_always_pass() {
        let candidates = vec![
            candidate("m0", 50, &["a"]),
            candidate("m1", 50, &["b"]),
            candidate("s0", 5, &[]),
            candidate("s1", 5, &["a"]),
            candidate("l0", 500, &["a"]),
        ];

        // max 4: with 3 already accepted the overlap allowance is spent, so
        // the repeat-tagged l0 is dropped while the untagged s0 got through
        let selected = ensure_diversity(candidates, 4);

        assert_eq!(names(&selected), vec!["m0", "m1", "s0"]);
    }

    #[test]
    fn overlap_allowed_while_under_half_of_max() {
        let candidates = vec![
            candidate("m0", 50, &["a"]),
            candidate("m1", 50, &["a"]),
            candidate("m2", 50, &["a"]),
            candidate("s0", 5, &["a"]),
            candidate("l0", 500, &["b"]),
        ];

        // max 4: medium quota 2. m0 brings the new tag "a"; m1 repeats it but
        // the output holds 0 < 2 entries when medium is filtered, so it stays.
        // s0 repeats "a" after 2 are accepted and is dropped; l0 has a fresh
        // tag and stays.
        let selected = ensure_diversity(candidates, 4);

        assert_eq!(names(&selected), vec!["m0", "m1", "l0"]);
    }

    #[test]
    fn only_the_bucket_prefix_is_evaluated() {
        let candidates = vec![
            candidate("m0", 50, &["a"]),
            candidate("m1", 50, &["b"]),
            candidate("m2", 50, &["c"]),
            candidate("s0", 5, &["d", "a"]),
            candidate("s1", 5, &["d"]),
        ];

        // max 4: the medium quota of 2 accepts m0 and m1; m2 sits past the
        // quota and is never looked at, so "c" stays unseen. The small quota
        // of 1 admits s0 on its fresh "d"; s1 is past the quota.
        let selected = ensure_diversity(candidates, 4);

        assert_eq!(names(&selected), vec!["m0", "m1", "s0"]);
    }

    #[test]
    fn fractional_half_threshold_for_odd_max() {
        let candidates = vec![
            candidate("m0", 50, &["a"]),
            candidate("m1", 50, &["a"]),
            candidate("m2", 50, &["a"]),
            candidate("s0", 5, &["a"]),
            candidate("s1", 5, &[]),
            candidate("l0", 500, &[]),
            candidate("l1", 500, &[]),
            candidate("x", 50, &["a"]),
        ];

        // max 5: medium quota 2, side quotas 1. The medium bucket is filtered
        // against 0 accepted (< 2.5), so both repeats of "a" stay; the small
        // bucket is filtered against 2 accepted (still < 2.5), so s0 stays
        // despite repeating "a".
        let selected = ensure_diversity(candidates, 5);

        assert_eq!(names(&selected), vec!["m0", "m1", "s0", "l0"]);
    }

    #[test]
    fn zero_max_count_yields_empty() {
        let candidates = vec![candidate("m0", 50, &[]), candidate("m1", 50, &[])];

        assert!(ensure_diversity(candidates, 0).is_empty());
    }

    #[test]
    fn empty_input_yields_empty() {
        let selected = ensure_diversity(Vec::<Candidate>::new(), 10);

        assert!(selected.is_empty());
    }
}
