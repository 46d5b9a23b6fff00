use crate::interop::{new_obj, set_kv};
use js_sys::Reflect;
use polysel::SelectError;
use wasm_bindgen::prelude::*;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    set_kv(&root, "error", &e.into());
    root.into()
}

/// `error.message` of a failed envelope.
pub fn message(envelope: &JsValue) -> Option<String> {
    let e = Reflect::get(envelope, &JsValue::from_str("error")).ok()?;
    Reflect::get(&e, &JsValue::from_str("message")).ok()?.as_string()
}

pub fn from_select(e: &SelectError) -> JsValue {
    match e {
        SelectError::NotFound(id) => {
            let d = new_obj();
            set_kv(&d, "id", &JsValue::from_f64(id.0 as f64));
            err(e.code(), e.to_string(), Some(d.into()))
        }
        SelectError::InvalidInput { .. } => err(e.code(), e.to_string(), None),
    }
}

#[inline]
pub fn invalid_array(param: &str, len: usize, reason: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    set_kv(&d, "len", &JsValue::from_f64(len as f64));
    err("invalid_array", format!("array '{}' {}", param, reason), Some(d.into()))
}

#[inline]
pub fn non_finite(param: &str, index: usize) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    set_kv(&d, "index", &JsValue::from_f64(index as f64));
    err("non_finite", format!("'{}[{}]' must be finite and within bounds", param, index), Some(d.into()))
}

#[inline]
pub fn too_large(param: &str, max: usize, got: usize) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    set_kv(&d, "max", &JsValue::from_f64(max as f64));
    set_kv(&d, "got", &JsValue::from_f64(got as f64));
    err("too_large", format!("'{}' exceeds the limit of {}", param, max), Some(d.into()))
}

#[inline]
pub fn invalid_event(reason: impl Into<String>) -> JsValue {
    err("invalid_event", reason, None)
}
