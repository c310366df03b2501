mod common;

use bankid_merchant::Communicator;
use bankid_merchant::xmldsig::{SignOptions, sign_xml};

use common::{MockMessenger, test_context};

const IDX_NS: &str = "http://www.betaalvereniging.nl/iDx/messages/Merchant-Acquirer/1.0.0";

fn directory_res() -> String {
    format!(
        "<DirectoryRes xmlns=\"{IDX_NS}\" productID=\"NL:BVN:BankID:1.0\" version=\"1.0.0\">\
         <createDateTimestamp>2020-01-02T03:04:05.000Z</createDateTimestamp>\
         <Acquirer><acquirerID>0001</acquirerID></Acquirer>\
         <Directory><directoryDateTimestamp>2019-12-01T00:00:00.000Z</directoryDateTimestamp>\
         <Country><countryNames>Nederland</countryNames>\
         <Issuer><issuerID>INGBNL2A</issuerID><issuerName>ING</issuerName></Issuer>\
         <Issuer><issuerID>RABONL2U</issuerID><issuerName>Rabobank</issuerName></Issuer>\
         </Country>\
         <Country><countryNames>Belgi\u{eb}</countryNames>\
         <Issuer><issuerID>KREDBE22</issuerID><issuerName>KBC</issuerName></Issuer>\
         </Country></Directory></DirectoryRes>"
    )
}

fn error_res() -> String {
    format!(
        "<AcquirerErrorRes xmlns=\"{IDX_NS}\" productID=\"NL:BVN:BankID:1.0\" version=\"1.0.0\">\
         <createDateTimestamp>2020-01-02T03:04:05.000Z</createDateTimestamp>\
         <Error><errorCode>SO1000</errorCode><errorMessage>Failure in system</errorMessage>\
         <suggestedAction>Try again later</suggestedAction>\
         <consumerMessage>Betalen met iDIN is op dit moment niet mogelijk.</consumerMessage>\
         </Error><Acquirer><acquirerID>0001</acquirerID></Acquirer></AcquirerErrorRes>"
    )
}

#[tokio::test]
async fn directory_round_trip_yields_issuers() {
    let context = test_context();
    let response_xml = sign_xml(
        &context.routing_key_pair,
        &directory_res(),
        &SignOptions::default(),
    )
    .expect("Failed to sign response fixture");

    let messenger = MockMessenger::new(response_xml);
    let sent = messenger.sent_log();
    let communicator = Communicator::with_messenger(context.configuration, messenger).unwrap();

    let response = communicator.get_directory().await;

    assert!(!response.is_error(), "{:?}", response.error());
    assert_eq!(response.issuers().len(), 3);
    assert_eq!(response.issuers()[0].issuer_id, "INGBNL2A");
    assert_eq!(response.issuers()[0].issuer_country, "Nederland");
    assert_eq!(response.issuers()[2].issuer_country, "Belgi\u{eb}");
    assert!(response.directory_date_timestamp().is_some());
    assert!(response.raw_message().contains("DirectoryRes"));

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (message, url) = &sent[0];
    assert_eq!(url.as_str(), "https://acquirer.example/directory");
    assert!(message.contains("<merchantID>1234567890</merchantID>"));
    assert!(message.contains("<subID>42</subID>"));
    assert!(message.contains("<Signature xmlns=\"http://www.w3.org/2000/09/xmldsig#\">"));
}

#[tokio::test]
async fn acquirer_error_surfaces_as_error_response() {
    let context = test_context();
    let response_xml = sign_xml(
        &context.routing_key_pair,
        &error_res(),
        &SignOptions::default(),
    )
    .expect("Failed to sign response fixture");

    let communicator =
        Communicator::with_messenger(context.configuration, MockMessenger::new(response_xml))
            .unwrap();

    let response = communicator.get_directory().await;

    assert!(response.is_error());
    let error = response.error().unwrap();
    assert_eq!(error.error_code(), Some("SO1000"));
    assert_eq!(error.suggested_action(), Some("Try again later"));
    assert!(response.issuers().is_empty());
}

#[tokio::test]
async fn unsigned_response_is_rejected() {
    let context = test_context();
    let communicator =
        Communicator::with_messenger(context.configuration, MockMessenger::new(directory_res()))
            .unwrap();

    let response = communicator.get_directory().await;

    assert!(response.is_error());
    assert!(
        response
            .error()
            .unwrap()
            .error_message()
            .contains("signature")
    );
}

#[tokio::test]
async fn response_signed_by_an_unknown_certificate_is_rejected() {
    let context = test_context();
    // Signed by the bank key, which is not a trusted routing certificate.
    let response_xml = sign_xml(
        &context.bank_key_pair,
        &directory_res(),
        &SignOptions::default(),
    )
    .unwrap();

    let communicator =
        Communicator::with_messenger(context.configuration, MockMessenger::new(response_xml))
            .unwrap();

    let response = communicator.get_directory().await;
    assert!(response.is_error());
}

#[test]
fn blocking_wrapper_returns_the_same_result() {
    let context = test_context();
    let response_xml = sign_xml(
        &context.routing_key_pair,
        &directory_res(),
        &SignOptions::default(),
    )
    .unwrap();

    let communicator =
        Communicator::with_messenger(context.configuration, MockMessenger::new(response_xml))
            .unwrap();

    let response = communicator.get_directory_blocking();
    assert!(!response.is_error(), "{:?}", response.error());
    assert_eq!(response.issuers().len(), 3);
}
