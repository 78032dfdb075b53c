//! Where is the user? A one-shot lookup answered on a worker thread.

use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::GeolocationError;
use crate::models::Coords;

pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json/";

pub trait Geolocator: Send + 'static {
    fn locate(&self) -> Result<Coords, GeolocationError>;
}

/// Rough position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
}

#[derive(Deserialize, Debug)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>) -> Self {
        IpGeolocator { url: url.into() }
    }
}

impl Default for IpGeolocator {
    fn default() -> Self {
        IpGeolocator::new(DEFAULT_LOOKUP_URL)
    }
}

impl Geolocator for IpGeolocator {
    fn locate(&self) -> Result<Coords, GeolocationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                warn!("Error building geolocation client: {}", e);
                GeolocationError::Unavailable
            })?;

        let response = client.get(&self.url).send().map_err(|e| {
            warn!("Error fetching location: {}", e);
            GeolocationError::Unavailable
        })?;

        let body = response.json::<IpLookupResponse>().map_err(|e| {
            warn!("Error parsing location response: {}", e);
            GeolocationError::Unavailable
        })?;

        coords_from_response(body)
    }
}

fn coords_from_response(body: IpLookupResponse) -> Result<Coords, GeolocationError> {
    if body.status.as_deref().is_some_and(|s| s != "success") {
        debug!(status = ?body.status, "location lookup refused");
        return Err(GeolocationError::Unavailable);
    }
    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Ok(Coords::new(lat, lon)),
        _ => Err(GeolocationError::Unavailable),
    }
}

/// A position that is known up front, e.g. from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coords);

impl Geolocator for FixedLocation {
    fn locate(&self) -> Result<Coords, GeolocationError> {
        Ok(self.0)
    }
}

/// Never answers with a position.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl Geolocator for NoLocation {
    fn locate(&self) -> Result<Coords, GeolocationError> {
        Err(GeolocationError::Unavailable)
    }
}

/// An in-flight lookup. Yields exactly one result.
pub struct PositionRequest {
    rx: Receiver<Result<Coords, GeolocationError>>,
    done: bool,
    _handle: JoinHandle<()>,
}

pub fn request_position<G: Geolocator>(locator: G) -> PositionRequest {
    let (tx, rx) = channel();
    let handle = thread::spawn(move || {
        let result = locator.locate();
        match &result {
            Ok(coords) => info!(%coords, "position acquired"),
            Err(e) => warn!("{}", e),
        }
        let _ = tx.send(result);
    });

    PositionRequest {
        rx,
        done: false,
        _handle: handle,
    }
}

impl PositionRequest {
    /// Non-blocking poll, `None` until the answer arrives and after it was taken.
    pub fn try_result(&mut self) -> Option<Result<Coords, GeolocationError>> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.done = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(GeolocationError::Unavailable))
            }
        }
    }

    /// Block until the answer arrives.
    pub fn wait(mut self) -> Result<Coords, GeolocationError> {
        if self.done {
            return Err(GeolocationError::Unavailable);
        }
        self.done = true;
        self.rx.recv().unwrap_or(Err(GeolocationError::Unavailable))
    }

    pub fn is_pending(&self) -> bool {
        !self.done
    }
}
