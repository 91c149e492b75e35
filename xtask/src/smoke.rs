use anyhow::{anyhow, Context};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde_json::{json, Value};

// API Gateway answers 401 to requests without a user agent.
const USER_AGENT: &str = "xtask-smoke/0.1";

pub struct SmokeTargets<'a> {
    pub server_url: Option<&'a str>,
    pub lambda_url: Option<&'a str>,
    pub id: &'a str,
    pub jwt: Option<&'a str>,
}

/// Runs every configured smoke step and returns how many failed.
pub fn run(targets: SmokeTargets<'_>) -> usize {
    let client = match Client::builder().user_agent(USER_AGENT).build() {
        Ok(client) => client,
        Err(error) => {
            eprintln!("failed to build http client: {error}");
            return 1;
        }
    };

    let mut failures = 0;

    if let Some(base) = targets.server_url {
        match server_steps(&client, base, targets.id) {
            Ok(steps) => {
                for (label, request) in steps {
                    if !report(label, request) {
                        failures += 1;
                    }
                }
            }
            Err(error) => {
                eprintln!("invalid server url: {error:#}");
                failures += 1;
            }
        }
    }

    if let Some(url) = targets.lambda_url {
        let mut request = client.get(url).query(&[("id", targets.id)]);
        if let Some(jwt) = targets.jwt {
            request = request.bearer_auth(jwt);
        }
        if !report("lambda get", request) {
            failures += 1;
        }
    }

    failures
}

fn server_steps(
    client: &Client,
    base: &str,
    id: &str,
) -> anyhow::Result<[(&'static str, RequestBuilder); 4]> {
    let home = api_url(base, &[])?;
    let record = api_url(base, &["api", id])?;
    let all = api_url(base, &["api"])?;
    let body = json!({ "foo": "bar", "a": 2, "bool": true });

    Ok([
        ("home", client.get(home)),
        ("put", client.post(record.clone()).json(&body)),
        ("get", client.get(record)),
        ("get-all", client.get(all)),
    ])
}

/// Appends `segments` to the base URL's path; each segment is escaped, so an
/// id containing `/` or spaces stays a single path segment.
fn api_url(base: &str, segments: &[&str]) -> anyhow::Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("cannot parse {base}"))?;
    url.path_segments_mut()
        .map_err(|()| anyhow!("{base} cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn report(label: &str, request: RequestBuilder) -> bool {
    eprintln!("\n=== smoke: {label} ===");
    let response = match request.send() {
        Ok(response) => response,
        Err(error) => {
            eprintln!("error: {error}");
            return false;
        }
    };

    let status = response.status();
    let text = response.text().unwrap_or_default();
    let rendered = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or(text);

    eprintln!("status: {status}\n{rendered}");
    status.is_success()
}
