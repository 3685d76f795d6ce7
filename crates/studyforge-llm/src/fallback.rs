//! Renderable markdown returned in place of a failed generation.

/// Characters of the prompt shown in the service-issue text.
const PROMPT_PREVIEW_CHARS: usize = 100;

#[must_use]
pub fn authentication(details: &str) -> String {
    format!(
        "# 🔑 Authentication Error

**Access Token Issue Detected**

The study proxy rejected your credentials:

1. **Verify your access token** in `STUDYFORGE_ACCESS_TOKEN` (or the variable named by `[proxy].access_token_env`)
2. **Sign in again** if the token has expired
3. **Check the proxy URL** points at your own deployment
4. **Run the command again** after updating the token

**Error details**: {details}"
    )
}

#[must_use]
pub fn quota(details: &str) -> String {
    format!(
        "# 📊 Quota Exceeded

**API Usage Limit Reached**

The generation provider's quota has been exceeded:

**Solutions:**
- **Wait and retry** - quotas reset periodically
- **Check your usage** with your proxy administrator
- **Try shorter content** to reduce token usage

**Error details**: {details}"
    )
}

#[must_use]
pub fn connection(details: &str) -> String {
    format!(
        "# 🌐 Connection Error

**Network Issue Detected**

There's a connectivity problem:

**Troubleshooting:**
- **Check your internet connection**
- **Try again in a few moments**
- **Verify the proxy URL** (`STUDYFORGE_PROXY_URL` or `[proxy].base_url`)
- **Check your firewall/proxy settings**

**Error details**: {details}"
    )
}

/// Text returned once the anonymous cap is reached. No backend call is made.
#[must_use]
pub fn limit_reached(limit: u32) -> String {
    format!(
        "# 🔒 Free Limit Reached

You have used all {limit} free generations on this device.

**To keep studying:**
- Sign in and export your access token as `STUDYFORGE_ACCESS_TOKEN`
- Run the command again"
    )
}

/// Generic text for failures that fit no other category.
#[must_use]
pub fn service_issue(service: &str, prompt: &str) -> String {
    let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
    format!(
        "# ⚠️ Temporary Service Issue - {service}

**Note**: There seems to be a temporary issue with the {service} service. Please try again in a moment.

**If the issue persists, check:**
- Your access token is valid and active
- You have sufficient quota remaining
- Your internet connection is stable
- The study proxy is deployed and reachable

**Troubleshooting Steps:**
1. Wait 30 seconds and try again
2. Check `STUDYFORGE_PROXY_URL` and your access token
3. Verify your internet connection
4. Try with a shorter document or simpler request

**Attempting to process**: {preview}..."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texts_carry_details() {
        assert!(authentication("HTTP 401").contains("**Error details**: HTTP 401"));
        assert!(quota("429").starts_with("# 📊 Quota Exceeded"));
        assert!(connection("reset").contains("Network Issue Detected"));
        assert!(limit_reached(10).contains("all 10 free generations"));
    }

    #[test]
    fn service_issue_previews_prompt() {
        let text = service_issue("AI", &"p".repeat(300));
        assert!(text.contains(&format!("{}...", "p".repeat(100))));
        assert!(!text.contains(&"p".repeat(101)));
    }
}
