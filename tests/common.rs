use std::path::Path;
use std::process::Output;

/// Run an `ldns-*` command through the `ldns` test binary.
#[track_caller]
pub fn run_ldns_cmd(args: &[&str], cwd: &Path) -> Output {
    test_bin::get_test_bin("ldns")
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap()
}

/// Run the `mergezone` binary.
#[track_caller]
pub fn run_mergezone(args: &[&str], cwd: &Path) -> Output {
    test_bin::get_test_bin("mergezone")
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap()
}

/// A zone with a single algorithm, signed with made up signatures.
pub fn zone(serial: u32, algorithm: u8) -> String {
    let rrsig = |owner: &str, rtype: &str, labels: u8| {
        format!(
            "{owner} 3600 IN RRSIG {rtype} {algorithm} {labels} 3600 20300101000000 20240101000000 4711 example.test. c2lnbmF0dXJl\n"
        )
    };
    let mut zone = format!(
        "example.test. 3600 IN SOA ns.example.test. admin.example.test. {serial} 3600 900 604800 300\n"
    );
    zone.push_str(&rrsig("example.test.", "SOA", 2));
    zone.push_str(&format!(
        "example.test. 3600 IN DNSKEY 257 3 {algorithm} AQIDBAUGBwg=\n"
    ));
    zone.push_str(&rrsig("example.test.", "DNSKEY", 2));
    zone.push_str("ns.example.test. 3600 IN A 192.0.2.1\n");
    zone.push_str(&rrsig("ns.example.test.", "A", 3));
    zone
}
