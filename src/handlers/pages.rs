//! Static confirmation pages.
//!
//! Stripe redirects the customer here after the hosted checkout page. The
//! content is static; the success page carries the session id in its query
//! string for anything that wants to poll the status endpoint.

use axum::response::Html;

/// `GET /checkout/success`
pub async fn success_handler() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html>
  <head><title>Payment received</title></head>
  <body>
    <h1>Thank you!</h1>
    <p>Your payment was received. A confirmation email is on its way.</p>
  </body>
</html>"#,
    )
}

/// `GET /checkout/cancel`
pub async fn cancel_handler() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html>
  <head><title>Checkout cancelled</title></head>
  <body>
    <h1>Checkout cancelled</h1>
    <p>No payment was taken. You can retry whenever you like.</p>
  </body>
</html>"#,
    )
}
