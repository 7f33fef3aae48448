use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use rust_decimal::Decimal;
use std::sync::Arc;
use voucher_checkout::{
    api::{
        format,
        session::{SessionOptions, SubmitOutcome},
        validation,
    },
    checkout::VoucherCheckout,
    config::APP_CONFIG,
    consts,
    models::{
        bin::CardBrand,
        card::{CardField, CardInput},
        checkout::{CheckoutOptions, GatewayEnv},
    },
    services::{
        BinLookupService, ImplBinLookupService, ImplTokenizationService,
        bin_lookup::PagarmeBinClient, tokenization::PagarmeTokenClient,
    },
};

#[derive(Args, Debug, Clone)]
pub struct CardArgs {
    #[arg(long)]
    number: String,
    #[arg(long, default_value = "")]
    name: String,
    /// `MM/YY` or `MMYY`
    #[arg(long, default_value = "")]
    expiry: String,
    #[arg(long, default_value = "")]
    cvv: String,
    #[arg(long, default_value = "")]
    cpf: String,
}

impl CardArgs {
    fn fields(&self) -> [(CardField, &str); 5] {
        [
            (CardField::Number, self.number.as_str()),
            (CardField::HolderName, self.name.as_str()),
            (CardField::Expiry, self.expiry.as_str()),
            (CardField::Cvv, self.cvv.as_str()),
            (CardField::TaxId, self.cpf.as_str()),
        ]
    }

    /// Applies the same masks the form applies while typing.
    fn to_input(&self) -> CardInput {
        let digits: String = format::only_digits(&self.number)
            .chars()
            .take(consts::MAX_CARD_NUMBER_DIGITS)
            .collect();

        CardInput {
            number: format::format_card_number(&digits, consts::DEFAULT_CARD_GAPS),
            holder_name: self.name.clone(),
            expiry: format::format_expiry(&self.expiry),
            cvv: format::format_cvv(&self.cvv, consts::MAX_CVV_LENGTH),
            tax_id: format::format_cpf(&self.cpf),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    card: CardArgs,
    /// CVV length required by the card's BIN
    #[arg(long, default_value_t = consts::DEFAULT_CVV_LENGTH)]
    cvv_length: usize,
}

#[derive(Args, Debug, Clone)]
pub struct BinLookupArgs {
    /// Card number or at least its first six digits
    number: String,
}

#[derive(Args, Debug, Clone)]
pub struct TokenizeArgs {
    #[command(flatten)]
    card: CardArgs,
    /// Defaults to `GATEWAY_PUBLIC_KEY`
    #[arg(long)]
    public_key: Option<String>,
    /// Defaults to `GATEWAY_ENV`
    #[arg(long)]
    env: Option<GatewayEnv>,
    #[arg(long)]
    amount: Option<Decimal>,
    /// Accepted brands, e.g. `pluxee,vr`
    #[arg(long, value_delimiter = ',')]
    brands: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SampleCpfArgs {
    /// First nine digits, random when omitted
    #[arg(long)]
    base: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    /// Validate card fields offline
    Validate(ValidateArgs),
    /// Resolve a BIN against the bureau
    BinLookup(BinLookupArgs),
    /// Run the checkout flow and print the host events
    Tokenize(TokenizeArgs),
    /// Print a CPF with valid check digits
    SampleCpf(SampleCpfArgs),
}

/// Voucher card checkout tooling
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub action: Action,
}

impl AppArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        match &self.action {
            Action::Validate(args) => validate(args),
            Action::BinLookup(args) => bin_lookup(args).await,
            Action::Tokenize(args) => tokenize(args).await,
            Action::SampleCpf(args) => sample_cpf(args),
        }
    }
}

fn validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let input = args.card.to_input();
    let errors = validation::validate_card_input(&input, args.cvv_length, APP_CONFIG.timezone());
    let brand = CardBrand::from_prefix(&input.number_digits()).unwrap_or_default();

    let report = serde_json::json!({
        "valid": errors.is_empty(),
        "brand": brand,
        "input": input,
        "errors": errors,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn bin_lookup(args: &BinLookupArgs) -> anyhow::Result<()> {
    let digits = format::only_digits(&args.number);
    let Some(bin) = digits.get(..consts::BIN_LENGTH) else {
        bail!("a BIN needs {} digits, got {}", consts::BIN_LENGTH, digits.len());
    };

    let client = PagarmeBinClient::new(&APP_CONFIG.endpoints())?;
    let lookup = client.lookup_bin(bin).await;
    println!("{}", serde_json::to_string_pretty(&lookup)?);

    Ok(())
}

async fn tokenize(args: &TokenizeArgs) -> anyhow::Result<()> {
    let endpoints = APP_CONFIG.endpoints();
    let bin_service: ImplBinLookupService = Arc::new(PagarmeBinClient::new(&endpoints)?);
    let token_service: ImplTokenizationService = Arc::new(PagarmeTokenClient::new(endpoints)?);

    let template = SessionOptions {
        debounce: APP_CONFIG.bin_debounce(),
        timezone: APP_CONFIG.timezone(),
        ..Default::default()
    };
    let options = CheckoutOptions {
        amount: args.amount,
        voucher_brands: args.brands.iter().map(|name| CardBrand::from_name(name)).collect(),
        public_key: args
            .public_key
            .clone()
            .unwrap_or_else(|| APP_CONFIG.gateway_public_key.clone()),
        env: args.env.unwrap_or(APP_CONFIG.gateway_env),
        ..Default::default()
    };

    let (mut checkout, mut events) = VoucherCheckout::new(bin_service, token_service, template);
    checkout.open(options)?;

    let session = checkout.session_mut().context("checkout is not open")?;
    for (field, value) in args.card.fields() {
        session.update_field(field, value);
    }
    checkout.settle().await?;

    match checkout.submit()? {
        SubmitOutcome::Started => {
            checkout.settle().await?;
        }
        SubmitOutcome::Rejected(errors) => {
            println!("{}", serde_json::to_string_pretty(&errors)?);
            bail!("card fields are invalid");
        }
        SubmitOutcome::Blocked => {
            let reason = checkout
                .session()
                .and_then(|session| session.bin_error().or(session.global_error()))
                .unwrap_or("submission blocked")
                .to_string();
            bail!(reason);
        }
    }

    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}

fn sample_cpf(args: &SampleCpfArgs) -> anyhow::Result<()> {
    let base = match &args.base {
        Some(base) => format::only_digits(base),
        None => format!("{:09}", chrono::Utc::now().timestamp_micros().rem_euclid(1_000_000_000)),
    };
    if base.len() != 9 {
        bail!("the CPF base needs 9 digits, got {}", base.len());
    }

    let mut first_nine = [0u32; 9];
    for (slot, byte) in first_nine.iter_mut().zip(base.bytes()) {
        *slot = u32::from(byte - b'0');
    }
    let [first, second] = validation::cpf_check_digits(&first_nine);

    let cpf = format::format_cpf(&format!("{base}{first}{second}"));
    if !validation::validate_cpf(&cpf) {
        bail!("{cpf} is a repeated-digit sequence, pick another base");
    }
    println!("{cpf}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokenize_args() {
        let args = AppArgs::try_parse_from([
            "voucher-checkout",
            "tokenize",
            "--number",
            "6035123456789011",
            "--env",
            "staging",
            "--brands",
            "pluxee,vr",
        ])
        .unwrap();

        let Action::Tokenize(tokenize) = args.action else {
            panic!("expected tokenize");
        };
        assert_eq!(tokenize.env, Some(GatewayEnv::Staging));
        assert_eq!(tokenize.brands, vec!["pluxee", "vr"]);
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_card_args_apply_masks() {
        let card = CardArgs {
            number: "6035123456789011".into(),
            name: "MARIA SILVA".into(),
            expiry: "1299".into(),
            cvv: "12345".into(),
            cpf: "11144477735".into(),
        };

        let input = card.to_input();
        assert_eq!(input.number, "6035 1234 5678 9011");
        assert_eq!(input.expiry, "12/99");
        assert_eq!(input.cvv, "1234");
        assert_eq!(input.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_sample_cpf_rejects_short_base() {
        let args = SampleCpfArgs {
            base: Some("1234".into()),
        };
        assert!(sample_cpf(&args).is_err());
    }
}
