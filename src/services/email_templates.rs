//! HTML bodies for account emails.

use chrono::{Datelike, Utc};

pub const RESET_REQUEST_SUBJECT: &str = "Password Reset Request";
pub const RESET_SUCCESS_SUBJECT: &str = "Password Reset Successful";

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: #333; background-color: #f4f4f4; margin: 0; padding: 0; }
    .container { max-width: 600px; margin: 40px auto; background-color: white; border-radius: 8px; overflow: hidden; }
    .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; }
    .header.success { background: linear-gradient(135deg, #28a745 0%, #20c997 100%); }
    .content { padding: 40px 30px; }
    .button { display: inline-block; padding: 14px 32px; background: #764ba2; color: white !important; text-decoration: none; border-radius: 6px; font-weight: 600; margin: 20px 0; }
    .link-text { word-break: break-all; background-color: #f8f9fa; padding: 10px; border-radius: 4px; font-family: monospace; font-size: 12px; color: #666; }
    .warning { background-color: #fff3cd; border-left: 4px solid #ffc107; padding: 12px; margin: 20px 0; border-radius: 4px; }
    .footer { background-color: #f8f9fa; padding: 20px 30px; text-align: center; font-size: 12px; color: #666; border-top: 1px solid #e0e0e0; }
"#;

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(header_class: &str, title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><style>{style}</style></head>
<body>
  <div class="container">
    <div class="{header_class}"><h1 style="margin: 0;">{title}</h1></div>
    <div class="content">{content}</div>
    <div class="footer">
      <p>This is an automated email. Please do not reply to this message.</p>
      <p>&copy; {year} Inkwell. All rights reserved.</p>
    </div>
  </div>
</body>
</html>"#,
        style = STYLE,
        header_class = header_class,
        title = title,
        content = content,
        year = Utc::now().year(),
    )
}

fn describe_minutes(minutes: i64) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        1 => "1 minute".to_string(),
        m => format!("{} minutes", m),
    }
}

pub fn password_reset_request(reset_url: &str, username: &str, ttl_minutes: i64) -> String {
    let url = escape_html(reset_url);
    let content = format!(
        r#"
      <p>Hi {username},</p>
      <p>We received a request to reset your password. Click the button below to create a new password:</p>
      <div style="text-align: center;"><a href="{url}" class="button">Reset My Password</a></div>
      <p>Or copy and paste this link into your browser:</p>
      <div class="link-text">{url}</div>
      <div class="warning"><strong>Important:</strong> This link will expire in {expiry}.</div>
      <p>If you didn't request a password reset, you can safely ignore this email. Your password will remain unchanged.</p>
      <p>We will never ask for your password via email.</p>"#,
        username = escape_html(username),
        url = url,
        expiry = describe_minutes(ttl_minutes),
    );
    layout("header", "Password Reset Request", &content)
}

pub fn password_reset_success(username: &str) -> String {
    let content = format!(
        r#"
      <p>Hi {username},</p>
      <p>Your password has been successfully reset.</p>
      <p>If you did not perform this action, please contact our support team immediately.</p>
      <p>You can now log in with your new password.</p>"#,
        username = escape_html(username),
    );
    layout("header success", "Password Reset Successful", &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_contains_link_twice_and_expiry() {
        let url = "https://blog.example.com/reset-password/abc123";
        let html = password_reset_request(url, "ana", 60);
        assert_eq!(html.matches(url).count(), 2);
        assert!(html.contains("Hi ana,"));
        assert!(html.contains("expire in 1 hour"));
    }

    #[test]
    fn username_is_escaped() {
        let html = password_reset_success("<script>x</script>");
        assert!(!html.contains("<script>x"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn expiry_wording() {
        assert_eq!(describe_minutes(60), "1 hour");
        assert_eq!(describe_minutes(120), "2 hours");
        assert_eq!(describe_minutes(1), "1 minute");
        assert_eq!(describe_minutes(45), "45 minutes");
    }
}
