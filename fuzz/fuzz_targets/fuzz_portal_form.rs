//! Fuzz target: `handle_configure`
//!
//! Arbitrary `POST /configure` bodies.  Every reply is a 200 carrying valid
//! credentials or a 400 carrying none.
//!
//! cargo fuzz run fuzz_portal_form

#![no_main]

use ecomonitor::app::portal::handle_configure;
use ecomonitor::config::NetworkCredentials;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let reply = handle_configure(data);
    match (reply.status, &reply.submission) {
        (200, Some(creds)) => {
            // Re-validating must agree with what the handler accepted.
            let again = NetworkCredentials::new(creds.ssid(), creds.passphrase());
            assert_eq!(again.as_ref(), Ok(creds));
        }
        (400, None) => assert!(reply.body.starts_with("Error: ")),
        (status, submission) => panic!("inconsistent reply {status} / {submission:?}"),
    }
});
