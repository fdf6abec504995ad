fn main() {
    // Build-time endpoint configuration; see `config::TelemetryEndpoint`.
    println!("cargo:rerun-if-env-changed=AGRONODE_TELEMETRY_URL");
    println!("cargo:rerun-if-env-changed=AGRONODE_TELEMETRY_KEY");
    println!("cargo:rerun-if-env-changed=AGRONODE_FORECAST_KEY");
    println!("cargo:rerun-if-env-changed=AGRONODE_FORECAST_LOCATION");
    // Station credentials; see `adapters::wifi::WifiCredentials`.
    println!("cargo:rerun-if-env-changed=AGRONODE_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=AGRONODE_WIFI_PASS");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
