//! HTML of the consent page

use super::ConsentPageModel;

/// Form field carrying the login name
pub const LOGIN_ID_FIELD: &str = "loginId";
pub const PASSWORD_FIELD: &str = "password";
/// Submit button whose presence in the form data means consent
pub const AUTHORIZED_FIELD: &str = "authorized";
pub const DENIED_FIELD: &str = "denied";

/// Where the consent form is posted
pub const DECISION_PATH: &str = "/api/authorization/decision";

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn opt(value: &Option<String>) -> String {
    value.as_deref().map(escape).unwrap_or_default()
}

fn client_links(model: &ConsentPageModel) -> String {
    [
        ("Website", &model.client_uri),
        ("Privacy policy", &model.policy_uri),
        ("Terms of service", &model.tos_uri),
    ]
    .iter()
    .filter_map(|(label, uri)| {
        uri.as_deref()
            .map(|uri| format!(r#"<li><a href="{}" target="_blank">{}</a></li>"#, escape(uri), label))
    })
    .collect()
}

fn scope_list(model: &ConsentPageModel) -> String {
    model
        .scopes
        .iter()
        .map(|scope| {
            format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape(&scope.name),
                opt(&scope.description)
            )
        })
        .collect()
}

fn login_section(model: &ConsentPageModel) -> String {
    if !model.login_required {
        return format!(
            r#"<p class="user">Hello {}</p>"#,
            opt(&model.user_name)
        );
    }

    let read_only = if model.login_id_read_only { " readonly" } else { "" };
    format!(
        r#"<div class="login">
                <h3>Login</h3>
                <input type="text" name="{login_field}" placeholder="Login ID" value="{login_id}" autocomplete="username"{read_only}>
                <input type="password" name="{password_field}" placeholder="Password" autocomplete="current-password">
            </div>"#,
        login_field = LOGIN_ID_FIELD,
        login_id = escape(&model.login_id),
        read_only = read_only,
        password_field = PASSWORD_FIELD,
    )
}

/// Render the consent page
pub fn render(model: &ConsentPageModel) -> String {
    let logo = model
        .logo_uri
        .as_deref()
        .map(|uri| format!(r#"<img class="logo" src="{}" alt="">"#, escape(uri)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{service_name} | Authorization</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }}
        .logo {{ max-width: 120px; float: right; }}
        dl {{ background: #f8f9fa; padding: 10px; border-radius: 4px; }}
        dd {{ color: #555; margin-bottom: 8px; }}
        input {{ display: block; width: 100%; padding: 8px; margin-bottom: 10px; border: 1px solid #ddd; border-radius: 4px; }}
        button {{ padding: 10px 20px; border: none; border-radius: 4px; cursor: pointer; }}
        button[name="{authorized}"] {{ background: #007bff; color: white; }}
    </style>
</head>
<body>
    <h2>{service_name}</h2>
    <div class="client">
        {logo}
        <h3>{client_name}</h3>
        <p>{description}</p>
        <ul>{links}</ul>
    </div>
    <h3>Permissions</h3>
    <p>The application is requesting the following permissions.</p>
    <dl>{scopes}</dl>
    <form method="post" action="{action}">
        {login}
        <button type="submit" name="{authorized}" value="Authorize">Authorize</button>
        <button type="submit" name="{denied}" value="Deny">Deny</button>
    </form>
</body>
</html>
"#,
        service_name = opt(&model.service_name),
        logo = logo,
        client_name = opt(&model.client_name),
        description = opt(&model.description),
        links = client_links(model),
        scopes = scope_list(model),
        action = DECISION_PATH,
        login = login_section(model),
        authorized = AUTHORIZED_FIELD,
        denied = DENIED_FIELD,
    )
}
