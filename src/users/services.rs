use askama::Template;

use crate::{
    config::{UserField, UsersView},
    error::AppError,
    users::repo_types::User,
};

#[derive(Template)]
#[template(
    source = "<h1>here are the users: {% for f in fields %}{% if !loop.first %}, {% endif %}{{ f }}{% endfor %}</h1>",
    ext = "html"
)]
struct UsersTemplate<'a> {
    fields: Vec<&'a str>,
}

/// Builds the `<h1>` fragment served on `/`.
///
/// An empty slice is an error in both view modes.
pub fn render_users_html(
    users: &[User],
    view: UsersView,
    field: UserField,
) -> Result<String, AppError> {
    let selected: &[User] = match view {
        UsersView::All => users,
        UsersView::First => users.get(..1).unwrap_or(&[]),
    };
    if selected.is_empty() {
        return Err(AppError::NoUsers);
    }

    let page = UsersTemplate {
        fields: selected.iter().map(|u| field_value(u, field)).collect(),
    };
    Ok(page.render()?)
}

fn field_value(user: &User, field: UserField) -> &str {
    match field {
        UserField::Name => &user.name,
        UserField::Email => &user.email,
    }
}
