use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const JOB_CODE_PREFIX: &str = "TM-";

/// Human-facing job code such as `TM-4K7Q2ZPA`.
pub fn generate_job_code() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .filter(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        .take(8)
        .collect();
    format!("{}{}", JOB_CODE_PREFIX, suffix)
}
