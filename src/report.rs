use chrono::Utc;

// One line per event so the scheduler's log collector can grep on stage=.

pub fn stage(stage: &str, detail: impl AsRef<str>) {
    println!("{} stage={} {}", timestamp(), stage, detail.as_ref());
}

pub fn warn(stage: &str, detail: impl AsRef<str>) {
    eprintln!("{} stage={} {}", timestamp(), stage, detail.as_ref());
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
