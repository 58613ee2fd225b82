//! Zufallsquelle, die immer fehlschlaegt (nur fuer Tests)

use rand::{CryptoRng, RngCore};

pub(crate) struct KaputteQuelle;

impl RngCore for KaputteQuelle {
    fn next_u32(&mut self) -> u32 {
        unreachable!("KaputteQuelle liefert keine Zufallszahlen")
    }

    fn next_u64(&mut self) -> u64 {
        unreachable!("KaputteQuelle liefert keine Zufallszahlen")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        unreachable!("KaputteQuelle liefert keine Zufallszahlen")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("Entropie erschoepft"))
    }
}

impl CryptoRng for KaputteQuelle {}
