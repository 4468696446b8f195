//! Rollout Bucketing
//!
//! Maps a (user, feature) pair to a stable point in [0, 1).
//!
//! The point is the first four bytes of `MD5(user_id + ":" + feature)`,
//! read big-endian and divided by 2^32. Services already rolling out with
//! this construction keep every user in the same bucket.

use md5::{Digest, Md5};

const BUCKET_SPACE: f64 = 4_294_967_296.0; // 2^32

/// Returns the user's rollout position for `feature`, in [0, 1).
pub fn rollout_bucket(user_id: &str, feature: &str) -> f64 {
    let mut hasher = Md5::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(feature.as_bytes());
    let digest = hasher.finalize();

    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    f64::from(prefix) / BUCKET_SPACE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_in_unit_interval() {
        for i in 0..1000 {
            let bucket = rollout_bucket(&format!("user-{}", i), "beta");
            assert!((0.0..1.0).contains(&bucket));
        }
    }

    #[test]
    fn test_known_buckets() {
        // MD5("user-42:beta") starts with 0x5af2_4826
        assert!((rollout_bucket("user-42", "beta") - 0.355_259_427_33).abs() < 1e-10);
        assert!((rollout_bucket("user-1", "genai_analysis") - 0.622_256_137_43).abs() < 1e-10);
    }

    #[test]
    fn test_separator_is_part_of_the_input() {
        // "ab" + ":" + "c" and "a" + ":" + "bc" hash different strings
        assert_ne!(rollout_bucket("ab", "c"), rollout_bucket("a", "bc"));
    }

    #[test]
    fn test_bucket_depends_on_feature() {
        let differs = (0..50).any(|i| {
            let user = format!("user-{}", i);
            rollout_bucket(&user, "beta") != rollout_bucket(&user, "gamma")
        });
        assert!(differs);
    }
}
