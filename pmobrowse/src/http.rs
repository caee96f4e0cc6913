//! Blocking HTTP plumbing shared by the resolver, scanner and browser.

use std::time::Duration;

use ureq::Agent;

/// Status code plus the full body, read regardless of the status.
pub(crate) struct HttpText {
    pub status: u16,
    pub body: String,
}

impl HttpText {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Builds an agent bounded by `timeout` that does not turn 4xx/5xx into errors,
/// so callers can still inspect the body of a failed SOAP call.
pub(crate) fn agent(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();

    config.into()
}

pub(crate) fn get_text(agent: &Agent, url: &str, user_agent: &str) -> Result<HttpText, ureq::Error> {
    let mut response = agent.get(url).header("User-Agent", user_agent).call()?;
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpText { status, body })
}

/// GET that only reports the status code; the body is dropped unread.
pub(crate) fn get_status(agent: &Agent, url: &str, user_agent: &str) -> Result<u16, ureq::Error> {
    let response = agent.get(url).header("User-Agent", user_agent).call()?;
    Ok(response.status().as_u16())
}

pub(crate) fn post_xml(
    agent: &Agent,
    url: &str,
    soap_action: &str,
    user_agent: &str,
    body: String,
) -> Result<HttpText, ureq::Error> {
    let mut response = agent
        .post(url)
        .header("Content-Type", "text/xml; charset=utf-8")
        .header("SOAPAction", soap_action)
        .header("User-Agent", user_agent)
        .send(body)?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpText { status, body })
}
