/// Email bodies. Every message has a plain-text and an HTML rendition.
///
/// User-supplied text (comment previews, movie names) is HTML-escaped in the
/// HTML part only.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

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

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>{title}</title></head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    <h2>{title}</h2>
{body}
    <p style="color: #999; font-size: 12px; margin-top: 30px;">Online Movie Store</p>
</body>
</html>"#
    )
}

fn button(link: &str, label: &str) -> String {
    let link = escape_html(link);
    format!(
        r#"    <p style="margin: 24px 0;"><a href="{link}" style="background-color: #000; color: #fff; padding: 12px 24px; text-decoration: none; border-radius: 20px;">{label}</a></p>
    <p style="color: #666; font-size: 14px;">Or copy this link: {link}</p>"#
    )
}

pub fn activation(link: &str) -> RenderedEmail {
    let title = "Activate your account";
    RenderedEmail {
        subject: "Account Activation".to_string(),
        text: format!(
            "Welcome to the Online Movie Store!\n\n\
             Please activate your account using the link below. It expires in 24 hours.\n{link}\n"
        ),
        html: layout(
            title,
            &format!(
                "    <p>Welcome to the Online Movie Store! Your activation link expires in 24 hours.</p>\n{}",
                button(link, "Activate account")
            ),
        ),
    }
}

pub fn activation_complete(login_link: &str) -> RenderedEmail {
    let title = "Your account is active";
    RenderedEmail {
        subject: "Account Activated Successfully".to_string(),
        text: format!("Your account has been activated. You can log in here:\n{login_link}\n"),
        html: layout(
            title,
            &format!(
                "    <p>Your account has been activated.</p>\n{}",
                button(login_link, "Log in")
            ),
        ),
    }
}

pub fn password_reset(link: &str) -> RenderedEmail {
    let title = "Password reset request";
    RenderedEmail {
        subject: "Password Reset Request".to_string(),
        text: format!(
            "We received a request to reset your password.\n\
             Use the link below within 1 hour:\n{link}\n\n\
             If you did not request this, ignore this email.\n"
        ),
        html: layout(
            title,
            &format!(
                "    <p>We received a request to reset your password. The link expires in 1 hour.</p>\n{}\n    <p>If you did not request this, ignore this email.</p>",
                button(link, "Reset password")
            ),
        ),
    }
}

pub fn password_reset_complete(login_link: &str) -> RenderedEmail {
    let title = "Password changed";
    RenderedEmail {
        subject: "Your Password Has Been Successfully Reset".to_string(),
        text: format!("Your password has been reset. Log in with your new password:\n{login_link}\n"),
        html: layout(
            title,
            &format!(
                "    <p>Your password has been reset.</p>\n{}",
                button(login_link, "Log in")
            ),
        ),
    }
}

pub fn comment_reply(parent_preview: &str, reply_preview: &str, link: &str) -> RenderedEmail {
    let title = "New reply to your comment";
    RenderedEmail {
        subject: "Someone replied to your comment".to_string(),
        text: format!(
            "Your comment:\n  \"{parent_preview}\"\n\nReply:\n  \"{reply_preview}\"\n\nView the discussion:\n{link}\n"
        ),
        html: layout(
            title,
            &format!(
                "    <p>Your comment:</p>\n    <blockquote>{}</blockquote>\n    <p>Reply:</p>\n    <blockquote>{}</blockquote>\n{}",
                escape_html(parent_preview),
                escape_html(reply_preview),
                button(link, "View discussion")
            ),
        ),
    }
}

pub fn comment_like(comment_preview: &str, link: &str) -> RenderedEmail {
    let title = "Your comment was liked";
    RenderedEmail {
        subject: "Someone liked your comment".to_string(),
        text: format!("Someone liked your comment:\n  \"{comment_preview}\"\n\n{link}\n"),
        html: layout(
            title,
            &format!(
                "    <p>Someone liked your comment:</p>\n    <blockquote>{}</blockquote>\n{}",
                escape_html(comment_preview),
                button(link, "View comment")
            ),
        ),
    }
}

pub fn payment_success(order_id: i64, amount: &str, movies: &[String]) -> RenderedEmail {
    let title = "Payment received";
    let text_items: String = movies.iter().map(|m| format!("  - {m}\n")).collect();
    let html_items: String = movies
        .iter()
        .map(|m| format!("        <li>{}</li>\n", escape_html(m)))
        .collect();
    RenderedEmail {
        subject: format!("Payment confirmation for order #{order_id}"),
        text: format!(
            "Thank you for your purchase!\n\nOrder #{order_id}\nTotal: {amount}\n\nMovies:\n{text_items}"
        ),
        html: layout(
            title,
            &format!(
                "    <p>Thank you for your purchase!</p>\n    <p>Order #{order_id}, total {}</p>\n    <ul>\n{html_items}    </ul>",
                escape_html(amount)
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_contains_link_in_both_parts() {
        let email = activation("http://localhost:8000/api/v1/accounts/activate?token=abc");
        assert!(email.text.contains("token=abc"));
        assert!(email.html.contains("token=abc"));
        assert_eq!(email.subject, "Account Activation");
    }

    #[test]
    fn comment_previews_are_escaped_in_html_only() {
        let email = comment_reply("<b>first</b>", "a & b", "http://x/1");
        assert!(email.text.contains("<b>first</b>"));
        assert!(email.html.contains("&lt;b&gt;first&lt;/b&gt;"));
        assert!(email.html.contains("a &amp; b"));
    }

    #[test]
    fn payment_success_lists_movies() {
        let email = payment_success(42, "19.98", &["Heat".into(), "Alien".into()]);
        assert!(email.subject.contains("#42"));
        assert!(email.text.contains("  - Heat\n"));
        assert!(email.html.contains("<li>Alien</li>"));
    }
}
