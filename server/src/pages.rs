//! HTML surface. Static pages ship as templates pulled in at compile
//! time; the two pages that carry request data are assembled inline.

use axum::response::Html;
use secrets_identity_core::{SubmittedSecret, User};

pub fn home() -> Html<&'static str> {
    Html(include_str!("../templates/home.html"))
}

pub fn register() -> Html<&'static str> {
    Html(include_str!("../templates/register.html"))
}

pub fn submit(error: Option<&str>) -> Html<String> {
    let notice = match error {
        Some(message) => format!(r#"<p class="error">{}</p>"#, escape_html(message)),
        None => String::new(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Submit a Secret</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <h1>Submit a Secret</h1>
    {notice}
    <form action="/submit" method="post">
        <label>Your secret <input type="text" name="secret" required></label>
        <button type="submit">Submit</button>
    </form>
    <p><a href="/secrets">Back to secrets</a></p>
</body>
</html>
"#
    ))
}

pub fn login(error: Option<&str>) -> Html<String> {
    let notice = match error {
        Some(message) => format!(r#"<p class="error">{}</p>"#, escape_html(message)),
        None => String::new(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Login - Secrets</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <h1>Login</h1>
    {notice}
    <form action="/login" method="post">
        <label>Username <input type="text" name="username" required></label>
        <label>Password <input type="password" name="password" required></label>
        <button type="submit">Login</button>
    </form>
    <p>No account? <a href="/register">Register</a></p>
    <ul class="providers">
        <li><a href="/auth/google">Sign in with Google</a></li>
        <li><a href="/auth/facebook">Sign in with Facebook</a></li>
        <li><a href="/auth/twitter">Sign in with Twitter</a></li>
        <li><a href="/auth/oauth2">Sign in with OAuth2</a></li>
    </ul>
</body>
</html>
"#
    ))
}

pub fn secrets(user: &User, secrets: &[SubmittedSecret]) -> Html<String> {
    let who = user
        .display_name
        .as_deref()
        .or(user.username.as_deref())
        .unwrap_or("anonymous");

    let items = if secrets.is_empty() {
        "<li>No secrets yet. <a href=\"/submit\">Submit one.</a></li>".to_string()
    } else {
        secrets
            .iter()
            .map(|s| format!("<li>{}</li>", escape_html(&s.text)))
            .collect::<Vec<_>>()
            .join("\n        ")
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Secrets</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <h1>Secrets</h1>
    <p>Welcome, {}.</p>
    <ul class="secrets">
        {items}
    </ul>
    <p><a href="/submit">Submit a secret</a> | <a href="/logout">Logout</a></p>
</body>
</html>
"#,
        escape_html(who)
    ))
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
            other => out.push(other),
        }
    }
    out
}
