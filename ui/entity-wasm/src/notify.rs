//! Transient toast notices.

use ed_api_types::Notice;
use gloo_timers::callback::Timeout;
use web_sys::Element;

use crate::dom;

const NOTICE_TTL_MS: u32 = 4_500;

pub fn show(stack: &Element, notice: &Notice) {
    let Ok(toast) = build(notice) else {
        return;
    };
    if stack.append_child(&toast).is_err() {
        return;
    }
    Timeout::new(NOTICE_TTL_MS, move || toast.remove()).forget();
}

fn build(notice: &Notice) -> Result<Element, wasm_bindgen::JsValue> {
    let toast = dom::create_element("div")?;
    toast.set_class_name(&format!("notice notice--{}", notice.level.as_str()));
    toast.set_attribute("role", "status")?;

    let title = dom::create_element("strong")?;
    dom::set_text(&title, &notice.title);
    toast.append_child(&title)?;

    if let Some(description) = &notice.description {
        let body = dom::create_element("p")?;
        dom::set_text(&body, description);
        toast.append_child(&body)?;
    }
    Ok(toast)
}
