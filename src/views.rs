//! Server-rendered pages and the partial updates sent back to the browser.
//!
//! Partial updates are turbo-stream documents: each one names an action
//! (`prepend`, `replace`, `remove`, ...) and a DOM target id.

use std::sync::Arc;

use axum::{
    http::header,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tera::{Context, Tera};

use crate::{
    error::AppResult,
    models::{Item, TodoList},
};

pub const TURBO_STREAM_MIME: &str = "text/vnd.turbo-stream.html";

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("show.html", include_str!("../templates/show.html")),
    ("todo_list.html", include_str!("../templates/todo_list.html")),
    ("item.html", include_str!("../templates/item.html")),
    (
        "todo_list_form.html",
        include_str!("../templates/todo_list_form.html"),
    ),
    ("item_form.html", include_str!("../templates/item_form.html")),
    ("flash.html", include_str!("../templates/flash.html")),
    ("stream.html", include_str!("../templates/stream.html")),
];

/// A rendered turbo-stream body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurboStream(pub String);

impl IntoResponse for TurboStream {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, TURBO_STREAM_MIME)], self.0).into_response()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TodoListForm {
    pub action: String,
    pub name: String,
    pub errors: Vec<String>,
}

impl TodoListForm {
    pub fn blank() -> Self {
        Self {
            action: "/todolists".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemForm {
    pub action: String,
    pub title: String,
    pub description: String,
    pub errors: Vec<String>,
}

impl ItemForm {
    pub fn blank(todo_list_id: i64) -> Self {
        Self {
            action: format!("/todolists/{todo_list_id}/items"),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum FlashLevel {
    Notice,
    Alert,
}

#[derive(Clone)]
pub struct Views {
    tera: Arc<Tera>,
}

impl Views {
    pub fn new() -> AppResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn index(&self, todo_lists: &[TodoList], form: &TodoListForm) -> AppResult<Html<String>> {
        let mut context = Context::new();
        context.insert("todo_lists", todo_lists);
        context.insert("form", form);
        Ok(Html(self.tera.render("index.html", &context)?))
    }

    pub fn show(&self, list: &TodoList, items: &[Item], form: &ItemForm) -> AppResult<Html<String>> {
        let mut context = Context::new();
        context.insert("list", list);
        context.insert("items", items);
        context.insert("form", form);
        Ok(Html(self.tera.render("show.html", &context)?))
    }

    pub fn item(&self, item: &Item) -> AppResult<Html<String>> {
        Ok(Html(self.render_item(item)?))
    }

    pub fn item_form(&self, form: &ItemForm) -> AppResult<Html<String>> {
        Ok(Html(self.render_item_form(form)?))
    }

    pub fn todo_list_created(&self, list: &TodoList) -> AppResult<TurboStream> {
        self.streams(&[
            ("prepend", "todo_lists", self.render_todo_list(list)?),
            (
                "replace",
                "todo_list_form",
                self.render_todo_list_form(&TodoListForm::blank())?,
            ),
            self.flash(FlashLevel::Notice, "List created")?,
        ])
    }

    pub fn todo_list_updated(&self, list: &TodoList) -> AppResult<TurboStream> {
        self.streams(&[
            (
                "replace",
                &format!("todo_list_{}", list.id),
                self.render_todo_list(list)?,
            ),
            self.flash(FlashLevel::Notice, "List updated")?,
        ])
    }

    pub fn todo_list_invalid(&self, form: &TodoListForm) -> AppResult<TurboStream> {
        let alert = format!("Error saving list: {}", to_sentence(&form.errors));
        self.streams(&[
            ("replace", "todo_list_form", self.render_todo_list_form(form)?),
            self.flash(FlashLevel::Alert, &alert)?,
        ])
    }

    pub fn todo_list_removed(&self, id: i64) -> AppResult<TurboStream> {
        self.streams(&[
            ("remove", &format!("todo_list_{id}"), String::new()),
            self.flash(FlashLevel::Notice, "List deleted")?,
        ])
    }

    pub fn complete_all_started(&self) -> AppResult<TurboStream> {
        self.streams(&[self.flash(FlashLevel::Notice, "Completing items")?])
    }

    pub fn item_created(&self, item: &Item) -> AppResult<TurboStream> {
        self.streams(&[
            ("append", "items", self.render_item(item)?),
            (
                "replace",
                "item_form",
                self.render_item_form(&ItemForm::blank(item.todo_list_id))?,
            ),
            self.flash(FlashLevel::Notice, "Item created")?,
        ])
    }

    pub fn item_invalid(&self, form: &ItemForm) -> AppResult<TurboStream> {
        let alert = format!("Error: {}", to_sentence(&form.errors));
        self.streams(&[
            ("replace", "item_form", self.render_item_form(form)?),
            self.flash(FlashLevel::Alert, &alert)?,
        ])
    }

    /// Used for edits and toggles alike.
    pub fn item_replaced(&self, item: &Item) -> AppResult<TurboStream> {
        self.streams(&[(
            "replace",
            &format!("item_{}", item.id),
            self.render_item(item)?,
        )])
    }

    pub fn item_removed(&self, item: &Item) -> AppResult<TurboStream> {
        self.streams(&[
            ("remove", &format!("item_{}", item.id), String::new()),
            self.flash(FlashLevel::Notice, "Item deleted")?,
        ])
    }

    fn render_todo_list(&self, list: &TodoList) -> AppResult<String> {
        let mut context = Context::new();
        context.insert("list", list);
        Ok(self.tera.render("todo_list.html", &context)?)
    }

    fn render_item(&self, item: &Item) -> AppResult<String> {
        let mut context = Context::new();
        context.insert("item", item);
        Ok(self.tera.render("item.html", &context)?)
    }

    fn render_todo_list_form(&self, form: &TodoListForm) -> AppResult<String> {
        let mut context = Context::new();
        context.insert("form", form);
        Ok(self.tera.render("todo_list_form.html", &context)?)
    }

    fn render_item_form(&self, form: &ItemForm) -> AppResult<String> {
        let mut context = Context::new();
        context.insert("form", form);
        Ok(self.tera.render("item_form.html", &context)?)
    }

    fn flash(
        &self,
        level: FlashLevel,
        message: &str,
    ) -> AppResult<(&'static str, &'static str, String)> {
        let mut context = Context::new();
        context.insert("level", &level);
        context.insert("message", message);
        Ok(("replace", "flash", self.tera.render("flash.html", &context)?))
    }

    fn streams(&self, parts: &[(&str, &str, String)]) -> AppResult<TurboStream> {
        let mut body = String::new();
        for (action, target, content) in parts {
            let mut context = Context::new();
            context.insert("action", action);
            context.insert("target", target);
            context.insert("content", content);
            body.push_str(&self.tera.render("stream.html", &context)?);
            body.push('\n');
        }
        Ok(TurboStream(body))
    }
}

/// `["a", "b", "c"]` -> `"a, b, and c"`
fn to_sentence(words: &[String]) -> String {
    match words {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
