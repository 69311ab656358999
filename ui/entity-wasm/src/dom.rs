//! DOM element bindings.
//!
//! All fields are resolved once at startup. A missing id fails `bind()` so a
//! broken page shows up immediately in the console.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlTextAreaElement};

pub fn document() -> Document {
    gloo_utils::document()
}

pub fn window() -> web_sys::Window {
    gloo_utils::window()
}

pub fn by_id(id: &str) -> Option<Element> {
    document().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn set_hidden(el: &Element, hidden: bool) {
    toggle_class(el, "hidden", hidden);
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    document().create_element(tag)
}

fn require<T: JsCast>(id: &str) -> Result<T, JsValue> {
    by_id_typed::<T>(id).ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))
}

#[derive(Clone)]
pub struct Elements {
    pub app_root: Element,
    pub card: Element,
    pub account_title: Element,
    pub loading: Element,
    pub error_panel: Element,
    pub view_panel: Element,
    pub display: Element,
    pub edit_btn: HtmlElement,
    pub edit_panel: Element,
    pub draft: HtmlTextAreaElement,
    pub save_btn: HtmlButtonElement,
    pub notice_stack: Element,
}

impl Elements {
    pub fn bind() -> Result<Self, JsValue> {
        Ok(Self {
            app_root: require("entityApp")?,
            card: require("entityCard")?,
            account_title: require("entityAccount")?,
            loading: require("entityLoading")?,
            error_panel: require("entityError")?,
            view_panel: require("entityViewPanel")?,
            display: require("entityDisplay")?,
            edit_btn: require("editEntityBtn")?,
            edit_panel: require("entityEditPanel")?,
            draft: require("entityDraft")?,
            save_btn: require("saveEntityBtn")?,
            notice_stack: require("noticeStack")?,
        })
    }
}
