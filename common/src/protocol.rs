use std::collections::HashMap;

use log::info;

use crate::{
    controller::{LedController, RgbOutput},
    settings::StorageVolume,
    status::StatusSlot,
};

pub const CONTENT_TYPE_OK: &str = "text/html";
pub const CONTENT_TYPE_ERROR: &str = "text/plain";

pub type QueryParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_OK,
            body: body.into(),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: 400,
            content_type: CONTENT_TYPE_ERROR,
            body: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    LightOn,
    LightOff,
    LightStatus,
    SetBrightness,
    GetBrightness,
    SetHue,
    GetHue,
    SetSaturation,
    GetSaturation,
    Root,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Self::LightOn,
        Self::LightOff,
        Self::LightStatus,
        Self::SetBrightness,
        Self::GetBrightness,
        Self::SetHue,
        Self::GetHue,
        Self::SetSaturation,
        Self::GetSaturation,
        Self::Root,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::LightOn => "/api/lightOn",
            Self::LightOff => "/api/lightOff",
            Self::LightStatus => "/api/lightStatus",
            Self::SetBrightness => "/api/setBrightness",
            Self::GetBrightness => "/api/getBrightness",
            Self::SetHue => "/api/setHue",
            Self::GetHue => "/api/getHue",
            Self::SetSaturation => "/api/setSaturation",
            Self::GetSaturation => "/api/getSaturation",
            Self::Root => "/api",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    fn required_param(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::SetBrightness => Some(("brightness", "Please specify brightness!")),
            Self::SetHue => Some(("hue", "Please specify hue!")),
            // Message text is what deployed clients have always received.
            Self::SetSaturation => Some(("saturation", "Please specify hue!")),
            _ => None,
        }
    }
}

pub fn dispatch<O, V>(
    route: Route,
    params: &QueryParams,
    controller: &mut LedController<O, V>,
    status: &StatusSlot,
) -> Reply
where
    O: RgbOutput,
    V: StorageVolume,
{
    info!("+ '{}' requested", route.path());

    let Some((name, missing_message)) = route.required_param() else {
        status.publish(format!("[GET] '{}'", route.path()));
        return handle_plain(route, controller);
    };

    let raw = params.get(name).map(String::as_str);
    let Some((raw, value)) = raw.and_then(|raw| parse_int(raw).map(|value| (raw, value))) else {
        status.publish(format!("[GET] '{}' (no {name})", route.path()));
        return Reply::bad_request(missing_message);
    };

    info!("+ PARAM {name} found: {raw}");
    status.publish(format!("[GET] '{}' > {raw}", route.path()));

    match route {
        Route::SetBrightness => controller.set_brightness_percent(value),
        Route::SetHue => controller.set_hue_degrees(value),
        _ => controller.set_saturation_percent(value),
    };
    Reply::ok(raw)
}

fn handle_plain<O, V>(route: Route, controller: &mut LedController<O, V>) -> Reply
where
    O: RgbOutput,
    V: StorageVolume,
{
    match route {
        Route::LightOn => {
            controller.turn_on();
            Reply::ok("1")
        }
        Route::LightOff => {
            controller.turn_off();
            Reply::ok("0")
        }
        Route::LightStatus => Reply::ok(if controller.is_on() { "1" } else { "0" }),
        Route::GetBrightness => Reply::ok(controller.brightness_percent().to_string()),
        Route::GetHue => Reply::ok(controller.hue_degrees().to_string()),
        Route::GetSaturation => Reply::ok(controller.saturation_percent().to_string()),
        Route::Root | Route::SetBrightness | Route::SetHue | Route::SetSaturation => {
            Reply::bad_request("Please specify endpoint!")
        }
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

pub fn parse_query(uri: &str) -> QueryParams {
    let Some((_, query)) = uri.split_once('?') else {
        return QueryParams::new();
    };

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    let decoded = urlencoding::decode(&raw).map(|value| value.into_owned());
    decoded.unwrap_or(raw)
}
