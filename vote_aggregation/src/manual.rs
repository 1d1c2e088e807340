/*!

This is the long-form manual for `vote_aggregation` and `bairro-tally`.

## Input files

Three tables are read for every reporting year. All of them are
`;`-separated text files with a header row. The column names below are the
defaults; each one can be changed in the configuration file.

### Votes

One row per (section, candidate) pair.

| column             | content                                 |
|--------------------|-----------------------------------------|
| `NR_ZONA`          | zone number                             |
| `NR_SECAO`         | section number                          |
| `NR_LOCAL_VOTACAO` | polling place number                    |
| `DS_CARGO`         | office                                  |
| `NM_MUNICIPIO`     | city                                    |
| `NM_VOTAVEL`       | candidate name                          |
| `NR_VOTAVEL`       | ballot number                           |
| `QT_VOTOS`         | number of votes                         |
| `SQ_CANDIDATO`     | candidate sequence id (recent years)    |

A row with a missing column, a location or count that is not a number, or a
count that would overflow the total of its office is skipped. An empty office,
city or candidate name is kept as an empty key. The number of skipped rows is
reported at the end of every year.

### Neighborhoods

The mapping from a section to its neighborhood: `Zona Eleitoral`,
`Número do Local`, `Seção`, `Bairro`. This table may also be an Excel
workbook (`.xlsx`). It is read once and shared by all the years.

### Candidates

Only for the years in which the vote table has no `SQ_CANDIDATO` column:
`DS_CARGO`, `NR_CANDIDATO`, `SQ_CANDIDATO`. A missing file is not an error,
the sequence ids are then left empty.

## Output

```text
{
  "GOVERNADOR": {
    "TOTAL_RJ": 1200,
    "CIDADES": {
      "NITERÓI": {
        "total_validos": 300,
        "candidatos": [
          {"nome": "ANA", "numero": "10", "votos": 150, "sq_candidato": null, "posicao": 1},
          ...
        ],
        "BAIRROS": {
          "CENTRO": {"total_validos": 120, "candidatos": [...]}
        }
      }
    }
  }
}
```

Candidates with the same number of votes are ranked in the order in which
they first appear in the vote table.

Sections missing from the neighborhood table are counted in the city and the
office totals, but in no neighborhood. The sum of the neighborhood totals of a
city may then be lower than the city total.

The summary of every city is also written to its own file, holding every
office in which the city appears.
*/
