use blindvote::ElectionKeyPair;
use rsa::traits::PublicKeyParts;

pub fn command_keygen(matches: &clap::ArgMatches) {
    // Unwrap is OK, bits has a default
    let bits: usize = matches
        .value_of("bits")
        .unwrap()
        .parse()
        .unwrap_or_else(|e| {
            eprintln!("blindvote keygen: invalid --bits: {}", e);
            std::process::exit(1);
        });

    if bits < 2048 {
        eprintln!("blindvote: WARNING: using insecure keysize for the election authority")
    }

    let mut rng = rand::thread_rng();
    let keys = ElectionKeyPair::generate(bits, &mut rng).unwrap_or_else(|e| {
        eprintln!("blindvote keygen: {}", e);
        std::process::exit(1);
    });
    let public = keys.public_key();

    println!("modulus: {}", hex::encode(public.n().to_bytes_be()));
    println!("exponent: {}", hex::encode(public.e().to_bytes_be()));
}
