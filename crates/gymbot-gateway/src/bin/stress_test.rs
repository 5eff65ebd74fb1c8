//! Load test: concurrent simulated users walk the full workout flow against the gateway.
//! Each user starts, picks a language, builds a routine, finishes it and leaves feedback.
//! Run with gateway up: cargo run --bin stress_test

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

const BASE_URL: &str = "http://127.0.0.1:8080";
const CONCURRENT_USERS: usize = 10;
const WORKOUTS_PER_USER: usize = 3;

// Button prefixes pressed in order after `/start`. Returning users land on the
// main menu and skip the language step.
const FLOW: &[&str] = &[
    "start_workout",
    "workout_",
    "routine_",
    "confirm_routine_",
    "finish_workout_",
    "workout_feedback_",
];

#[derive(Debug, Deserialize)]
struct Button {
    callback_data: String,
}

#[derive(Debug, Deserialize)]
struct ScreenReply {
    state: String,
    keyboard: Vec<Vec<Button>>,
}

impl ScreenReply {
    /// The `pick`-th button (wrapping) whose token starts with `prefix`.
    fn choose(&self, prefix: &str, pick: usize) -> Option<String> {
        let matching: Vec<&Button> = self
            .keyboard
            .iter()
            .flatten()
            .filter(|b| b.callback_data.starts_with(prefix))
            .collect();
        if matching.is_empty() {
            return None;
        }
        Some(matching[pick % matching.len()].callback_data.clone())
    }
}

async fn send(
    client: &Client,
    user_id: &str,
    kind: &str,
    data: &str,
    latencies: &RwLock<Vec<u64>>,
) -> Option<ScreenReply> {
    let body = json!({
        "user_id": user_id,
        "first_name": format!("Load {user_id}"),
        "kind": kind,
        "data": data,
    });
    let start = Instant::now();
    let resp = client
        .post(format!("{}/api/v1/updates", BASE_URL))
        .json(&body)
        .send()
        .await
        .ok()?;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    if !resp.status().is_success() {
        return None;
    }
    latencies.write().await.push(elapsed_ms);
    resp.json::<ScreenReply>().await.ok()
}

/// One pass through the flow. Returns false when a step is missing from the screen.
async fn walk(client: &Client, user_id: &str, round: usize, latencies: &RwLock<Vec<u64>>) -> bool {
    let Some(mut screen) = send(client, user_id, "command", "/start", latencies).await else {
        return false;
    };
    if let Some(token) = screen.choose("lang_", round) {
        match send(client, user_id, "callback", &token, latencies).await {
            Some(next) => screen = next,
            None => return false,
        }
    }
    for (step, prefix) in FLOW.iter().enumerate() {
        let Some(token) = screen.choose(prefix, round + step) else {
            println!(
                "[STRESS TEST] {} stuck at {} waiting for {}",
                user_id, screen.state, prefix
            );
            return false;
        };
        match send(client, user_id, "callback", &token, latencies).await {
            Some(next) => screen = next,
            None => return false,
        }
    }
    screen.state == "main_menu"
}

#[tokio::main]
async fn main() {
    println!(
        "[STRESS TEST] Starting: {} users x {} workouts",
        CONCURRENT_USERS, WORKOUTS_PER_USER
    );
    println!("[STRESS TEST] Target: {} (ensure gateway is running)", BASE_URL);

    let success = Arc::new(AtomicU32::new(0));
    let failure = Arc::new(AtomicU32::new(0));
    let latencies: Arc<RwLock<Vec<u64>>> = Arc::new(RwLock::new(Vec::new()));

    let client = Client::new();
    let run_tag = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut handles = Vec::new();
    for n in 0..CONCURRENT_USERS {
        let client = client.clone();
        let success = Arc::clone(&success);
        let failure = Arc::clone(&failure);
        let latencies = Arc::clone(&latencies);
        let user_id = format!("load-{run_tag}-{n}");

        let h = tokio::spawn(async move {
            for round in 0..WORKOUTS_PER_USER {
                if walk(&client, &user_id, n + round, &latencies).await {
                    success.fetch_add(1, Ordering::Relaxed);
                } else {
                    failure.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        handles.push(h);
    }

    for h in handles {
        let _ = h.await;
    }

    let s = success.load(Ordering::Relaxed);
    let f = failure.load(Ordering::Relaxed);
    let total = s + f;
    let success_rate = if total > 0 { (s as f64 / total as f64) * 100.0 } else { 0.0 };
    let latencies_guard = latencies.read().await;
    let avg_latency_ms = if latencies_guard.is_empty() {
        0.0
    } else {
        latencies_guard.iter().sum::<u64>() as f64 / latencies_guard.len() as f64
    };

    println!(
        "[STRESS TEST] Completed flows: {:.1}% | Average latency: {:.0}ms over {} requests",
        success_rate,
        avg_latency_ms,
        latencies_guard.len()
    );
    println!("[STRESS TEST] Total: {} | Success: {} | Failure: {}", total, s, f);
}
